/// SceneRegistry — the scene state machine the manager's operations run against.
///
/// Every method here takes effect immediately. `SceneManager` queues calls to
/// them and runs the queue at the start of its `update`.

use std::sync::Arc;
use glam::UVec2;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::{engine_bail, engine_err, engine_info, engine_debug, engine_warn};
use crate::logic::{EngineComponent, GameTime};
use crate::services::{FrameManager, GraphicsProvider};
use super::scene::{Scene, SceneId};

pub struct SceneRegistry {
    graphics: Arc<dyn GraphicsProvider>,
    scenes: FxHashMap<SceneId, Scene>,
    /// Ids in registration order
    registration_order: Vec<SceneId>,
    /// Ids in preparation order
    prepared: Vec<SceneId>,
    active: Option<SceneId>,
    suspended: Option<SceneId>,
    /// Ids in activation order
    overlays: Vec<SceneId>,
    size: UVec2,
}

impl SceneRegistry {
    pub(crate) fn new(graphics: Arc<dyn GraphicsProvider>, size: UVec2) -> Self {
        Self {
            graphics,
            scenes: FxHashMap::default(),
            registration_order: Vec::new(),
            prepared: Vec::new(),
            active: None,
            suspended: None,
            overlays: Vec::new(),
            size,
        }
    }

    // ===== ACCESSORS =====

    pub fn graphics(&self) -> &Arc<dyn GraphicsProvider> {
        &self.graphics
    }

    pub(crate) fn set_graphics(&mut self, graphics: Arc<dyn GraphicsProvider>) {
        self.graphics = graphics;
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn scene(&self, id: SceneId) -> Result<&Scene> {
        self.scenes.get(&id).ok_or_else(|| unknown(id))
    }

    pub fn scene_mut(&mut self, id: SceneId) -> Result<&mut Scene> {
        self.scenes.get_mut(&id).ok_or_else(|| unknown(id))
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Registered ids in registration order
    pub fn registered_scenes(&self) -> &[SceneId] {
        &self.registration_order
    }

    /// Whether `id` is prepared. Unknown ids are an error.
    pub fn is_prepared(&self, id: SceneId) -> Result<bool> {
        self.scene(id)?;
        Ok(self.prepared.contains(&id))
    }

    /// Prepared ids in preparation order
    pub fn prepared_scenes(&self) -> &[SceneId] {
        &self.prepared
    }

    pub fn active_scene_id(&self) -> Option<SceneId> {
        self.active
    }

    pub fn suspended_scene_id(&self) -> Option<SceneId> {
        self.suspended
    }

    pub fn active_scene(&self) -> Option<&Scene> {
        self.active.and_then(|id| self.scenes.get(&id))
    }

    pub fn suspended_scene(&self) -> Option<&Scene> {
        self.suspended.and_then(|id| self.scenes.get(&id))
    }

    pub fn overlays(&self) -> &[SceneId] {
        &self.overlays
    }

    // ===== REGISTRATION =====

    /// Register `scene` under `id`. Ids are never reused or removed.
    pub fn register(&mut self, id: SceneId, scene: Scene) -> Result<()> {
        if self.scenes.contains_key(&id) {
            engine_bail!("carbon::SceneManager", Error::DuplicateScene(id));
        }
        engine_debug!("carbon::SceneManager", "Registered scene {} ('{}')", id, scene.name());
        self.scenes.insert(id, scene);
        self.registration_order.push(id);
        Ok(())
    }

    /// Initialize `id` against the current graphics and size
    pub fn prepare(&mut self, id: SceneId) -> Result<()> {
        let scene = self.scenes.get_mut(&id).ok_or_else(|| unknown(id))?;
        if self.prepared.contains(&id) {
            engine_bail!("carbon::SceneManager", Error::InvalidOperation(format!(
                "Scene was already prepared: {}", id)));
        }
        scene.initialize(self.graphics.as_ref())?;
        scene.resize(self.size);
        self.prepared.push(id);
        Ok(())
    }

    /// Deactivate, hide, unload, and un-prepare `id`
    fn tear_down(&mut self, id: SceneId) -> Result<()> {
        let scene = self.scenes.get_mut(&id).ok_or_else(|| unknown(id))?;
        scene.set_active(false)?;
        scene.set_visible(false);
        scene.unload();
        self.prepared.retain(|k| *k != id);
        Ok(())
    }

    /// Activate a prepared-or-not scene; on failure unprepare it again if
    /// `prepared_here`
    fn bring_up(&mut self, id: SceneId, prepared_here: bool) -> Result<()> {
        let scene = self.scenes.get_mut(&id).ok_or_else(|| unknown(id))?;
        if let Err(err) = scene.set_active(true) {
            if prepared_here {
                scene.unload();
                self.prepared.retain(|k| *k != id);
            }
            return Err(err);
        }
        scene.set_visible(true);
        Ok(())
    }

    // ===== TRANSITIONS =====

    /// Make `id` the active scene.
    ///
    /// The previously active scene is suspended when `suspend_active` is set,
    /// torn down otherwise; this only happens once `id` is fully active. A
    /// scene that was already suspended is torn down when another one takes
    /// the suspended slot.
    pub fn activate_scene(&mut self, id: SceneId, suspend_active: bool) -> Result<()> {
        self.scene(id)?;
        if self.active == Some(id) {
            engine_bail!("carbon::SceneManager", Error::InvalidOperation(format!(
                "Scene is already active: {}", id)));
        }
        if self.overlays.contains(&id) {
            engine_bail!("carbon::SceneManager", Error::InvalidOperation(format!(
                "Can not activate scene while it is set as overlay: {}", id)));
        }

        self.scene(id)?.check_state()?;
        let prepared_here = !self.prepared.contains(&id);
        if prepared_here {
            self.prepare(id)?;
        }
        self.bring_up(id, prepared_here)?;

        if self.suspended == Some(id) {
            self.suspended = None;
        }
        if let Some(previous) = self.active.take() {
            if suspend_active {
                self.scene_mut(previous)?.set_active(false)?;
                if let Some(displaced) = self.suspended.replace(previous) {
                    self.tear_down(displaced)?;
                }
            } else {
                self.tear_down(previous)?;
            }
        }
        self.active = Some(id);

        engine_info!("carbon::SceneManager", "Activated scene {} (suspended: {:?})",
            id, self.suspended);
        Ok(())
    }

    /// Tear down the active scene and promote the suspended one, if any
    pub fn deactivate_scene(&mut self) -> Result<()> {
        let Some(id) = self.active else {
            engine_bail!("carbon::SceneManager",
                Error::InvalidOperation("No scene active".to_string()));
        };

        self.tear_down(id)?;
        self.active = None;

        if let Some(suspended) = self.suspended.take() {
            let scene = self.scenes.get_mut(&suspended).ok_or_else(|| unknown(suspended))?;
            if let Err(err) = scene.resume() {
                self.evict(suspended);
                return Err(err);
            }
            scene.set_visible(true);
            self.active = Some(suspended);
        }

        engine_info!("carbon::SceneManager", "Deactivated scene {} (active now: {:?})",
            id, self.active);
        Ok(())
    }

    /// Reload one prepared scene, or every prepared scene in registration order.
    ///
    /// Each scene is unloaded, initialized, and resized; a scene that was
    /// active or visible is restored to that state. Reloading everything
    /// clears the graphics cache first. A scene that fails to come back is
    /// evicted from the prepared set and from its slot before the error is
    /// returned.
    pub fn reload_scene(&mut self, id: Option<SceneId>) -> Result<()> {
        let targets: Vec<SceneId> = match id {
            Some(id) => {
                if !self.is_prepared(id)? {
                    engine_bail!("carbon::SceneManager", Error::InvalidOperation(format!(
                        "Can not reload unprepared scene: {}", id)));
                }
                vec![id]
            }
            None => {
                self.graphics.clear_cache();
                self.registration_order.iter()
                    .copied()
                    .filter(|k| self.prepared.contains(k))
                    .collect()
            }
        };

        for target in targets {
            let scene = self.scenes.get_mut(&target).ok_or_else(|| unknown(target))?;
            let was_active = scene.is_active();
            let was_visible = scene.is_visible();

            scene.unload();
            let restored = scene.initialize(self.graphics.as_ref()).and_then(|_| {
                scene.resize(self.size);
                if was_active { scene.resume() } else { Ok(()) }
            });
            if let Err(err) = restored {
                self.evict(target);
                return Err(err);
            }
            scene.set_visible(was_visible);
            engine_debug!("carbon::SceneManager", "Reloaded scene {}", target);
        }
        Ok(())
    }

    /// Show `id` on top of the active scene
    pub fn activate_overlay(&mut self, id: SceneId) -> Result<()> {
        self.scene(id)?;
        if self.active == Some(id) {
            engine_bail!("carbon::SceneManager", Error::InvalidOperation(format!(
                "Can not set the active scene as overlay: {}", id)));
        }
        if self.suspended == Some(id) {
            engine_bail!("carbon::SceneManager", Error::InvalidOperation(format!(
                "Can not set the suspended scene as overlay: {}", id)));
        }
        if self.overlays.contains(&id) {
            engine_bail!("carbon::SceneManager", Error::InvalidOperation(format!(
                "Scene overlay is already active: {}", id)));
        }

        self.scene(id)?.check_state()?;
        let prepared_here = !self.prepared.contains(&id);
        if prepared_here {
            self.prepare(id)?;
        }
        self.bring_up(id, prepared_here)?;
        self.overlays.push(id);

        engine_info!("carbon::SceneManager", "Activated overlay {}", id);
        Ok(())
    }

    pub fn deactivate_overlay(&mut self, id: SceneId) -> Result<()> {
        self.scene(id)?;
        if !self.overlays.contains(&id) {
            engine_bail!("carbon::SceneManager", Error::InvalidOperation(format!(
                "Scene overlay is not active: {}", id)));
        }
        self.tear_down(id)?;
        self.overlays.retain(|k| *k != id);

        engine_info!("carbon::SceneManager", "Deactivated overlay {}", id);
        Ok(())
    }

    /// Unload `id` and drop it from the prepared set and every slot
    fn evict(&mut self, id: SceneId) {
        if let Some(scene) = self.scenes.get_mut(&id) {
            scene.set_visible(false);
            if scene.is_initialized() {
                scene.unload();
            }
        }
        self.prepared.retain(|k| *k != id);
        if self.active == Some(id) {
            self.active = None;
        }
        if self.suspended == Some(id) {
            self.suspended = None;
        }
        self.overlays.retain(|k| *k != id);
        engine_warn!("carbon::SceneManager", "Evicted scene {} after a failed transition", id);
    }

    // ===== FRAME =====

    /// Update suspended, then active, then overlays
    pub(crate) fn update_scenes(&mut self, time: &GameTime) -> Result<()> {
        let order: Vec<SceneId> = self.suspended.iter()
            .chain(self.active.iter())
            .chain(self.overlays.iter())
            .copied()
            .collect();
        for id in order {
            self.scene_mut(id)?.update(time)?;
        }
        Ok(())
    }

    /// Render suspended (when visible), then active, then overlays
    pub(crate) fn render(&self, frame_manager: &mut dyn FrameManager) -> Result<()> {
        if let Some(suspended) = self.suspended_scene() {
            if suspended.is_visible() {
                suspended.render(frame_manager)?;
            }
        }
        if let Some(active) = self.active_scene() {
            active.render(frame_manager)?;
        }
        for id in &self.overlays {
            self.scene(*id)?.render(frame_manager)?;
        }
        Ok(())
    }

    /// Store `size` and forward it to every prepared scene
    pub(crate) fn resize(&mut self, size: UVec2) {
        self.size = size;
        for id in &self.prepared {
            if let Some(scene) = self.scenes.get_mut(id) {
                scene.resize(size);
            }
        }
    }

    /// Unload every prepared scene and clear all slots
    pub(crate) fn unload(&mut self) {
        for id in self.prepared.drain(..) {
            if let Some(scene) = self.scenes.get_mut(&id) {
                scene.set_visible(false);
                scene.unload();
            }
        }
        self.active = None;
        self.suspended = None;
        self.overlays.clear();
    }
}

fn unknown(id: SceneId) -> Error {
    engine_err!("carbon::SceneManager", Error::UnknownScene(id))
}
