//! Collaborator interfaces
//!
//! The scene core never owns a graphics device, a content pipeline, or a
//! scripting VM. It talks to them through the traits in this module, and
//! every implementation is handed in by the host at construction time.

mod graphics;
mod content;
mod scripting;
mod frame;
pub mod mock_services;

pub use graphics::GraphicsProvider;
pub use content::{ContentHash, ContentProvider, ContentProviderExt, ScriptResource};
pub use scripting::{ScriptHost, ScriptRuntime, SCRIPT_UPDATE_HOOK};
pub use frame::{FrameManager, FrameInstruction, FrameInstructionSet};
