//! Engine logic primitives
//!
//! The base component contract every scene piece composes through, the
//! frame timer, and the deferred dispatch stack used to schedule one-shot
//! work against components this code does not own.

mod component;
mod dispatch_stack;

pub use component::{EngineComponent, GameTime};
pub use dispatch_stack::DeferredDispatchStack;
