//! Error types for the Carbon engine
//!
//! This module defines the error types used throughout the scene core:
//! invariant violations, graph misuse, missing collaborators, and
//! collaborator failures. Every error is fatal to the operation that
//! produced it; the core never retries.

use std::fmt;
use crate::scene::SceneId;

/// Result type for Carbon engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Carbon engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// An invariant of the scene state machine was violated
    /// (double activation, double link, deactivate without an active scene...)
    InvalidOperation(String),

    /// Misuse of an entity or node graph (dead key, duplicate edge, cycle...)
    InvalidArgument(String),

    /// Scene id was never registered with the manager
    UnknownScene(SceneId),

    /// Scene id was registered twice
    DuplicateScene(SceneId),

    /// A scene is missing a collaborator it declared (runtime script, script host)
    SceneState(String),

    /// Initialization failed (scene, collaborator, subsystem)
    InitializationFailed(String),

    /// Collaborator-specific error (graphics, content, scripting, poisoned lock)
    BackendError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::UnknownScene(id) => write!(f, "Unknown scene: {}", id),
            Error::DuplicateScene(id) => write!(f, "Scene already registered: {}", id),
            Error::SceneState(msg) => write!(f, "Invalid scene state: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Log an error through the engine logger (with file:line) and yield it
///
/// # Example
///
/// ```ignore
/// let err = engine_err!("carbon::Scene",
///     Error::InvalidArgument(format!("entity {:?} is dead", key)));
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $err:expr) => {{
        let err: $crate::carbon::Error = $err;
        $crate::engine_error!($source, "{}", err);
        err
    }};
}

/// Log an error through the engine logger and return it from the current function
///
/// # Example
///
/// ```ignore
/// if self.scenes.contains_key(&id) {
///     engine_bail!("carbon::SceneManager", Error::DuplicateScene(id));
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $err:expr) => {
        return Err($crate::engine_err!($source, $err))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
