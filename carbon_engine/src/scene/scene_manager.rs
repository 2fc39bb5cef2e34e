//! Central scene manager for the engine.
//!
//! Owns every registered scene and the active/suspended/overlay slots.
//! Transitions (activate, deactivate, reload, overlays) are queued and run
//! at the start of the next `update`, so they never interleave with a
//! render: `render` takes `&self` and cannot touch the queue or the slots.

use std::sync::Arc;
use glam::UVec2;
use crate::error::Result;
use crate::engine_debug;
use crate::logic::{EngineComponent, GameTime};
use crate::services::{FrameManager, GraphicsProvider};
use super::operation_queue::OperationQueue;
use super::scene::{Scene, SceneId};
use super::scene_registry::SceneRegistry;

/// Scene manager configuration
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SceneManagerConfig {
    /// Size handed to scenes on prepare; defaults to the graphics viewport
    pub initial_size: Option<UVec2>,
    /// Maximum queued operations completed per update; unlimited when `None`
    pub operation_budget: Option<usize>,
}

pub struct SceneManager {
    registry: SceneRegistry,
    operations: OperationQueue<SceneRegistry>,
    operation_budget: Option<usize>,
    last_update: GameTime,
}

impl SceneManager {
    pub fn new(graphics: Arc<dyn GraphicsProvider>, config: SceneManagerConfig) -> Self {
        let size = config.initial_size.unwrap_or_else(|| graphics.viewport_size());
        Self {
            registry: SceneRegistry::new(graphics, size),
            operations: OperationQueue::new(),
            operation_budget: config.operation_budget,
            last_update: GameTime::default(),
        }
    }

    /// Swap the graphics provider used for subsequent prepares and reloads
    pub fn set_graphics(&mut self, graphics: Arc<dyn GraphicsProvider>) {
        self.registry.set_graphics(graphics);
    }

    // ===== ACCESSORS =====

    /// Immediate view of the scene state machine
    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn scene(&self, id: SceneId) -> Result<&Scene> {
        self.registry.scene(id)
    }

    pub fn scene_mut(&mut self, id: SceneId) -> Result<&mut Scene> {
        self.registry.scene_mut(id)
    }

    pub fn scene_count(&self) -> usize {
        self.registry.scene_count()
    }

    pub fn is_prepared(&self, id: SceneId) -> Result<bool> {
        self.registry.is_prepared(id)
    }

    pub fn prepared_scenes(&self) -> &[SceneId] {
        self.registry.prepared_scenes()
    }

    pub fn active_scene_id(&self) -> Option<SceneId> {
        self.registry.active_scene_id()
    }

    pub fn suspended_scene_id(&self) -> Option<SceneId> {
        self.registry.suspended_scene_id()
    }

    pub fn active_scene(&self) -> Option<&Scene> {
        self.registry.active_scene()
    }

    pub fn suspended_scene(&self) -> Option<&Scene> {
        self.registry.suspended_scene()
    }

    pub fn overlays(&self) -> &[SceneId] {
        self.registry.overlays()
    }

    pub fn size(&self) -> UVec2 {
        self.registry.size()
    }

    /// Names of queued operations, oldest first
    pub fn pending_operations(&self) -> Vec<&str> {
        self.operations.names()
    }

    // ===== IMMEDIATE =====

    /// Register `scene` under a unique `id`
    pub fn register(&mut self, id: SceneId, scene: Scene) -> Result<()> {
        self.registry.register(id, scene)
    }

    /// Initialize and size `id` now
    pub fn prepare(&mut self, id: SceneId) -> Result<()> {
        self.registry.prepare(id)
    }

    /// Store the new size and forward it to the graphics and every prepared scene
    pub fn resize(&mut self, size: UVec2) {
        self.registry.graphics().resize(size);
        self.registry.resize(size);
    }

    // ===== QUEUED =====

    /// Queue a custom operation against the registry.
    ///
    /// `op` receives the update time the operation was queued at. Returning
    /// `Ok(false)` keeps it queued for the next update.
    pub fn queue_operation<F>(&mut self, name: impl Into<String>, op: F)
    where
        F: FnMut(&mut SceneRegistry, std::time::Duration) -> Result<bool> + Send + 'static,
    {
        let name = name.into();
        engine_debug!("carbon::SceneManager", "Queued '{}'", name);
        self.operations.push(name, self.last_update.elapsed, op);
    }

    pub fn activate(&mut self, id: SceneId, suspend_active: bool) {
        self.queue_operation(format!("activate {}", id), move |registry, _| {
            registry.activate_scene(id, suspend_active).map(|_| true)
        });
    }

    pub fn deactivate(&mut self) {
        self.queue_operation("deactivate", |registry, _| {
            registry.deactivate_scene().map(|_| true)
        });
    }

    /// Reload one scene, or every prepared scene when `id` is `None`
    pub fn reload(&mut self, id: Option<SceneId>) {
        let name = match id {
            Some(id) => format!("reload {}", id),
            None => "reload all".to_string(),
        };
        self.queue_operation(name, move |registry, _| {
            registry.reload_scene(id).map(|_| true)
        });
    }

    pub fn activate_overlay(&mut self, id: SceneId) {
        self.queue_operation(format!("activate overlay {}", id), move |registry, _| {
            registry.activate_overlay(id).map(|_| true)
        });
    }

    pub fn deactivate_overlay(&mut self, id: SceneId) {
        self.queue_operation(format!("deactivate overlay {}", id), move |registry, _| {
            registry.deactivate_overlay(id).map(|_| true)
        });
    }

    // ===== FRAME =====

    /// Render suspended (when visible), active, then overlays
    pub fn render(&self, frame_manager: &mut dyn FrameManager) -> Result<()> {
        self.registry.render(frame_manager)
    }
}

impl EngineComponent for SceneManager {
    /// Adopt the viewport size of `graphics` and resize prepared scenes
    fn initialize(&mut self, graphics: &dyn GraphicsProvider) -> Result<()> {
        self.registry.resize(graphics.viewport_size());
        Ok(())
    }

    /// Run queued operations, then update suspended, active, and overlay scenes.
    ///
    /// A failed operation is dropped and its error returned; the remaining
    /// operations stay queued and scenes are not updated this frame.
    fn update(&mut self, time: &GameTime) -> Result<bool> {
        self.last_update = *time;
        self.operations.process(&mut self.registry, self.operation_budget)?;
        self.registry.update_scenes(time)?;
        Ok(true)
    }

    /// Unload every prepared scene and drop pending operations
    fn unload(&mut self) {
        self.operations.clear();
        self.registry.unload();
    }
}

#[cfg(test)]
#[path = "scene_manager_tests.rs"]
mod tests;
