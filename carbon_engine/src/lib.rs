/*!
# Carbon Engine

Scene lifecycle and entity graph core of the Carbon real-time 3D engine.

This crate owns the runtime side of scenes: which scene is active, suspended,
or shown as an overlay, which entities belong to which scene, and when their
transforms and bounds are recomputed. Graphics, content loading, scripting,
and frame submission are collaborator traits implemented by the host.

## Architecture

- **EngineComponent**: initialize/update/unload/dispose lifecycle contract
- **DeferredDispatchStack**: one-shot initialize/update scheduling by arena key
- **EntityGraph / SceneEntity**: multi-parent entity arena with lazy transforms
- **NodeTree**: single-parent grouping hierarchy
- **Scene**: linked entities, invalidation buckets, render lists
- **SceneManager**: scene registry with a queued activation state machine
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod logic;
pub mod scene;
pub mod services;

// Main carbon namespace module
pub mod carbon {
    // Error types
    pub use crate::error::{Error, Result};

    // Logger registry
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Component lifecycle and deferred dispatch
    pub mod logic {
        pub use crate::logic::*;
    }

    // Collaborator interfaces and their mocks
    pub mod services {
        pub use crate::services::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
