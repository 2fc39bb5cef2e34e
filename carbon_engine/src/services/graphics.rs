/// Graphics provider contract.
///
/// The core calls these synchronously from `initialize`, `resize`, and
/// `reload`. It never buffers graphics calls.

use glam::UVec2;
use crate::error::Result;

/// Device-side services a scene needs during its lifecycle
pub trait GraphicsProvider: Send + Sync {
    /// Current viewport size in pixels
    fn viewport_size(&self) -> UVec2;

    /// Notification that the output surface changed size
    fn resize(&self, size: UVec2);

    /// Drop cached device objects (shaders, textures...)
    fn clear_cache(&self);

    /// Reset the device (lost device, settings change)
    fn reset(&self) -> Result<()>;
}
