/// Content/resource provider contract.
///
/// Content is addressed by hash and returned as a typed payload.
/// A missing payload is `None`; deciding whether that is fatal belongs
/// to the caller.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Content address of a resource (mesh, material, script...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentHash {
    fn from(hash: &str) -> Self {
        Self::new(hash)
    }
}

/// Script source loaded from content, ready to hand to a `ScriptHost`
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptResource {
    /// Hash the script was loaded from
    pub hash: ContentHash,
    /// Script source text
    pub source: String,
}

/// Untyped content access, implemented by the host's resource layer
pub trait ContentProvider: Send + Sync {
    /// Resolve a hash to its payload, `None` if absent
    fn load_raw(&self, hash: &ContentHash) -> Option<Arc<dyn Any + Send + Sync>>;
}

/// Typed access on top of any `ContentProvider`
pub trait ContentProviderExt {
    /// Resolve a hash to a payload of type `T`.
    ///
    /// Returns `None` when the hash is unknown or the payload has another type.
    fn load<T: Any + Send + Sync>(&self, hash: &ContentHash) -> Option<Arc<T>>;
}

impl<P: ContentProvider + ?Sized> ContentProviderExt for P {
    fn load<T: Any + Send + Sync>(&self, hash: &ContentHash) -> Option<Arc<T>> {
        self.load_raw(hash)?.downcast::<T>().ok()
    }
}
