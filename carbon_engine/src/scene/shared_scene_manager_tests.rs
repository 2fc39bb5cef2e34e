/// Tests for SharedSceneManager

use super::*;
use crate::scene::{EntityGraph, Scene, SceneDesc, SceneManagerConfig};
use crate::services::mock_services::{MockGraphics, RecordingFrameManager, RecordingSceneBehavior};
use std::thread;
use std::time::Duration;

fn shared_with(ids: &[SceneId]) -> SharedSceneManager {
    let mut manager = SceneManager::new(MockGraphics::shared(), SceneManagerConfig::default());
    let journal = RecordingSceneBehavior::journal();
    for id in ids {
        let tag = format!("s{}", id);
        manager.register(*id, Scene::new(SceneDesc::new(tag.clone(), EntityGraph::shared())
            .with_behavior(RecordingSceneBehavior::new(tag, journal.clone())))).unwrap();
    }
    SharedSceneManager::new(manager)
}

#[test]
fn test_shortcuts_queue_and_update() {
    let shared = shared_with(&[1, 2]);
    shared.activate(1, false).unwrap();
    shared.activate(2, true).unwrap();
    assert_eq!(shared.lock().unwrap().pending_operations().len(), 2);

    shared.update(&GameTime::new(Duration::from_millis(16), Duration::from_millis(16))).unwrap();

    let manager = shared.lock().unwrap();
    assert_eq!(manager.active_scene_id(), Some(2));
    assert_eq!(manager.suspended_scene_id(), Some(1));
}

#[test]
fn test_clones_share_state() {
    let shared = shared_with(&[1]);
    let other = shared.clone();
    other.resize(UVec2::new(640, 360)).unwrap();
    assert_eq!(shared.lock().unwrap().size(), UVec2::new(640, 360));
}

#[test]
fn test_update_and_render_threads_serialize() {
    let shared = shared_with(&[1, 2]);
    shared.activate(1, false).unwrap();

    let updater = {
        let shared = shared.clone();
        thread::spawn(move || {
            let mut time = GameTime::default();
            for i in 0..50 {
                time = time.advanced(Duration::from_millis(16));
                if i == 10 {
                    shared.activate(2, true).unwrap();
                }
                if i == 30 {
                    shared.deactivate().unwrap();
                }
                shared.update(&time).unwrap();
            }
        })
    };
    let renderer = {
        let shared = shared.clone();
        thread::spawn(move || {
            let mut frames = RecordingFrameManager::new();
            for _ in 0..50 {
                shared.render(&mut frames).unwrap();
            }
            frames.begun
        })
    };

    updater.join().unwrap();
    let rendered_sets = renderer.join().unwrap();
    // Every render saw at least zero and at most two scenes
    assert!(rendered_sets <= 100);

    let manager = shared.lock().unwrap();
    assert_eq!(manager.active_scene_id(), Some(1));
    assert_eq!(manager.suspended_scene_id(), None);
}

#[test]
fn test_poisoned_lock_is_backend_error() {
    let shared = shared_with(&[]);
    let poisoner = shared.clone();
    let _ = thread::spawn(move || {
        let _guard = poisoner.lock().unwrap();
        panic!("poison the manager lock");
    })
    .join();

    assert!(matches!(shared.lock(), Err(Error::BackendError(_))));
    assert!(shared.deactivate().is_err());
}
