/// Frame/render sink contract.
///
/// Scenes only decide which entities populate an instruction set;
/// how the set is consumed belongs to the renderer behind `FrameManager`.

use glam::Mat4;
use crate::scene::{EntityKey, AABB};
use super::content::ContentHash;

/// A single draw request produced by a renderable entity
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInstruction {
    /// Entity that produced the instruction
    pub entity: EntityKey,
    /// Mesh content to draw
    pub mesh: ContentHash,
    /// Material content, if any
    pub material: Option<ContentHash>,
    /// Final world transform (parents * local)
    pub world: Mat4,
    /// Unscaled bounds carried through `world`, for culling in the renderer
    pub world_bounds: Option<AABB>,
}

/// Draw instructions accumulated between `begin_set` and `render_set`
#[derive(Debug, Clone, Default)]
pub struct FrameInstructionSet {
    /// Instructions in submission order
    pub instructions: Vec<FrameInstruction>,
}

impl FrameInstructionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Receives instruction sets from scenes
pub trait FrameManager {
    /// Start a new instruction set
    fn begin_set(&mut self) -> FrameInstructionSet;

    /// Commit an instruction set for rendering
    fn render_set(&mut self, set: FrameInstructionSet);
}
