//! Scene management module
//!
//! Entity graph, node tree, scenes, and the scene manager with its queued
//! activation state machine.

mod bounds;
mod buckets;
mod entity_graph;
mod node;
mod operation_queue;
mod scene;
mod scene_entity;
mod scene_manager;
mod scene_registry;
mod shared_scene_manager;

pub use bounds::{AABB, BoundingSphere};
pub use scene_entity::{
    BucketId, CameraEntity, EntityKey, EntityKind, EntityLink, LightEntity, MeshRef, ModelEntity,
    SceneEntity, DEFAULT_BUCKET,
};
pub use entity_graph::{EntityGraph, SharedEntityGraph};
pub use node::{Node, NodeKey, NodeTree};
pub use scene::{
    render_all_lists, DefaultSceneBehavior, RenderListId, Scene, SceneBehavior, SceneDesc, SceneId,
    SceneRenderContext, SceneRuntimeDesc, DEFAULT_RENDER_LIST,
};
pub use operation_queue::{Operation, OperationQueue};
pub use scene_manager::{SceneManager, SceneManagerConfig};
pub use scene_registry::SceneRegistry;
pub use shared_scene_manager::SharedSceneManager;
