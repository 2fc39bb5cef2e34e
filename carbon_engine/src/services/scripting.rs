/// Embedded scripting runtime contract.

use crate::error::Result;
use crate::logic::GameTime;
use super::content::ScriptResource;

/// Name of the callable a scene invokes once per update
pub const SCRIPT_UPDATE_HOOK: &str = "Update";

/// Turns a script resource into a live runtime
pub trait ScriptHost: Send + Sync {
    /// Load `script` into a fresh runtime.
    ///
    /// Returns `None` when the host could not produce a runtime; the scene
    /// treats that as a fatal scene-state error.
    fn create_runtime(&self, script: &ScriptResource) -> Option<Box<dyn ScriptRuntime>>;
}

/// A loaded script exposing named callables
pub trait ScriptRuntime: Send {
    /// Invoke a named callable
    fn call(&mut self, name: &str, time: &GameTime) -> Result<()>;

    /// Release the runtime. Called once, on scene deactivation.
    fn dispose(&mut self);
}
