/// Base component contract and frame timer.

use std::time::Duration;
use crate::error::Result;
use crate::services::GraphicsProvider;

/// Frame timing handed to every `update` call
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GameTime {
    /// Total time since the game loop started
    pub elapsed: Duration,
    /// Time since the previous update
    pub delta: Duration,
}

impl GameTime {
    pub fn new(elapsed: Duration, delta: Duration) -> Self {
        Self { elapsed, delta }
    }

    /// Timer for the next frame, `delta` after this one
    pub fn advanced(&self, delta: Duration) -> Self {
        Self {
            elapsed: self.elapsed + delta,
            delta,
        }
    }
}

/// Lifecycle contract shared by entities, nodes, scenes, and the scene manager.
///
/// All methods have no-op defaults so implementors only override what they use.
pub trait EngineComponent {
    /// Bind the component to a graphics context
    fn initialize(&mut self, _graphics: &dyn GraphicsProvider) -> Result<()> {
        Ok(())
    }

    /// Advance one frame. `Ok(false)` asks the caller to stop this cycle.
    fn update(&mut self, _time: &GameTime) -> Result<bool> {
        Ok(true)
    }

    /// Release loaded state; the component may be initialized again afterwards
    fn unload(&mut self) {}

    /// Final teardown
    fn dispose(&mut self) {
        self.unload();
    }
}
