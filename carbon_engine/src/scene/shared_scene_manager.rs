/// Thread-shared scene manager.
///
/// One mutex serializes update against render: the update thread and the
/// render thread each take the lock for the whole call. `render` only ever
/// sees `&SceneManager`.

use std::sync::{Arc, Mutex, MutexGuard};
use glam::UVec2;
use crate::error::{Error, Result};
use crate::engine_err;
use crate::logic::{EngineComponent, GameTime};
use crate::services::FrameManager;
use super::scene::SceneId;
use super::scene_manager::SceneManager;

#[derive(Clone)]
pub struct SharedSceneManager {
    inner: Arc<Mutex<SceneManager>>,
}

impl SharedSceneManager {
    pub fn new(manager: SceneManager) -> Self {
        Self { inner: Arc::new(Mutex::new(manager)) }
    }

    /// Exclusive access for anything not covered by the shortcuts below
    pub fn lock(&self) -> Result<MutexGuard<'_, SceneManager>> {
        self.inner.lock().map_err(|_| engine_err!("carbon::SharedSceneManager",
            Error::BackendError("Scene manager lock poisoned".to_string())))
    }

    pub fn update(&self, time: &GameTime) -> Result<()> {
        self.lock()?.update(time).map(|_| ())
    }

    pub fn render(&self, frame_manager: &mut dyn FrameManager) -> Result<()> {
        let manager = self.lock()?;
        manager.render(frame_manager)
    }

    pub fn resize(&self, size: UVec2) -> Result<()> {
        self.lock()?.resize(size);
        Ok(())
    }

    pub fn activate(&self, id: SceneId, suspend_active: bool) -> Result<()> {
        self.lock()?.activate(id, suspend_active);
        Ok(())
    }

    pub fn deactivate(&self) -> Result<()> {
        self.lock()?.deactivate();
        Ok(())
    }

    pub fn reload(&self, id: Option<SceneId>) -> Result<()> {
        self.lock()?.reload(id);
        Ok(())
    }
}

#[cfg(test)]
#[path = "shared_scene_manager_tests.rs"]
mod tests;
