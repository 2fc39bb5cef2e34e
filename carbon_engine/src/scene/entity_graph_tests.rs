/// Tests for EntityGraph
///
/// Edge symmetry, cycle rejection, world transform accumulation, and cloning.

use super::*;
use crate::logic::{EngineComponent, GameTime};
use glam::{Quat, Vec3};
use std::time::Duration;

fn translated(name: &str, offset: Vec3) -> SceneEntity {
    SceneEntity::empty(name).with_transform(offset, Quat::IDENTITY, Vec3::ONE)
}

// ============================================================================
// Tests: Arena
// ============================================================================

#[test]
fn test_insert_assigns_key() {
    let mut graph = EntityGraph::new();
    let key = graph.insert(SceneEntity::empty("a"));
    assert_eq!(graph.entity(key).unwrap().key(), key);
    assert_eq!(graph.len(), 1);
}

#[test]
fn test_remove_drops_edges_on_both_sides() {
    let mut graph = EntityGraph::new();
    let parent = graph.insert(SceneEntity::empty("p"));
    let child = graph.insert(SceneEntity::empty("c"));
    let grandchild = graph.insert(SceneEntity::empty("g"));
    graph.add_child(parent, child).unwrap();
    graph.add_child(child, grandchild).unwrap();

    let removed = graph.remove(child).unwrap();
    assert!(removed.parents().is_empty());
    assert!(removed.children().is_empty());
    assert!(graph.entity(parent).unwrap().children().is_empty());
    assert!(graph.entity(grandchild).unwrap().parents().is_empty());
    assert!(graph.entity(child).is_err());
}

#[test]
fn test_dead_key_is_invalid_argument() {
    let mut graph = EntityGraph::new();
    let key = graph.insert(SceneEntity::empty("a"));
    graph.remove(key).unwrap();
    assert!(matches!(graph.entity(key), Err(Error::InvalidArgument(_))));
    assert!(matches!(graph.world(key), Err(Error::InvalidArgument(_))));
}

// ============================================================================
// Tests: Edges
// ============================================================================

#[test]
fn test_add_child_is_symmetric() {
    let mut graph = EntityGraph::new();
    let parent = graph.insert(SceneEntity::empty("p"));
    let child = graph.insert(SceneEntity::empty("c"));
    graph.add_child(parent, child).unwrap();

    assert_eq!(graph.entity(parent).unwrap().children(), &[child]);
    assert_eq!(graph.entity(child).unwrap().parents(), &[parent]);
}

#[test]
fn test_add_parent_is_symmetric() {
    let mut graph = EntityGraph::new();
    let parent = graph.insert(SceneEntity::empty("p"));
    let child = graph.insert(SceneEntity::empty("c"));
    graph.add_parent(child, parent).unwrap();

    assert_eq!(graph.entity(parent).unwrap().children(), &[child]);
    assert_eq!(graph.entity(child).unwrap().parents(), &[parent]);
}

#[test]
fn test_duplicate_edge_rejected() {
    let mut graph = EntityGraph::new();
    let parent = graph.insert(SceneEntity::empty("p"));
    let child = graph.insert(SceneEntity::empty("c"));
    graph.add_child(parent, child).unwrap();
    assert!(matches!(graph.add_child(parent, child), Err(Error::InvalidArgument(_))));
    assert!(matches!(graph.add_parent(child, parent), Err(Error::InvalidArgument(_))));
    assert_eq!(graph.entity(parent).unwrap().children().len(), 1);
}

#[test]
fn test_self_edge_rejected() {
    let mut graph = EntityGraph::new();
    let a = graph.insert(SceneEntity::empty("a"));
    assert!(matches!(graph.add_child(a, a), Err(Error::InvalidArgument(_))));
}

#[test]
fn test_cycle_rejected() {
    let mut graph = EntityGraph::new();
    let a = graph.insert(SceneEntity::empty("a"));
    let b = graph.insert(SceneEntity::empty("b"));
    let c = graph.insert(SceneEntity::empty("c"));
    graph.add_child(a, b).unwrap();
    graph.add_child(b, c).unwrap();

    assert!(matches!(graph.add_child(c, a), Err(Error::InvalidArgument(_))));
    assert!(graph.entity(a).unwrap().parents().is_empty());
}

#[test]
fn test_remove_child_on_both_sides() {
    let mut graph = EntityGraph::new();
    let parent = graph.insert(SceneEntity::empty("p"));
    let child = graph.insert(SceneEntity::empty("c"));
    graph.add_child(parent, child).unwrap();
    graph.remove_parent(child, parent).unwrap();

    assert!(graph.entity(parent).unwrap().children().is_empty());
    assert!(graph.entity(child).unwrap().parents().is_empty());
    assert!(graph.remove_child(parent, child).is_err());
}

#[test]
fn test_subtree_lists_each_entity_once() {
    // Diamond: root -> (a, b) -> shared
    let mut graph = EntityGraph::new();
    let root = graph.insert(SceneEntity::empty("root"));
    let a = graph.insert(SceneEntity::empty("a"));
    let b = graph.insert(SceneEntity::empty("b"));
    let shared = graph.insert(SceneEntity::empty("shared"));
    graph.add_child(root, a).unwrap();
    graph.add_child(root, b).unwrap();
    graph.add_child(a, shared).unwrap();
    graph.add_child(b, shared).unwrap();

    let subtree = graph.subtree(root).unwrap();
    assert_eq!(subtree, vec![root, a, b, shared]);
}

// ============================================================================
// Tests: Transforms
// ============================================================================

#[test]
fn test_world_of_orphan_is_identity() {
    let mut graph = EntityGraph::new();
    let key = graph.insert(translated("a", Vec3::X));
    assert_eq!(graph.world(key).unwrap(), Mat4::IDENTITY);
    assert_eq!(graph.world_transform(key).unwrap(), Mat4::from_translation(Vec3::X));
}

#[test]
fn test_world_with_single_parent_is_parent_local() {
    let mut graph = EntityGraph::new();
    let parent = graph.insert(translated("p", Vec3::new(1.0, 2.0, 3.0)));
    let child = graph.insert(translated("c", Vec3::X));
    graph.add_child(parent, child).unwrap();

    let expected = graph.entity(parent).unwrap().local();
    assert_eq!(graph.world(child).unwrap(), expected);
}

#[test]
fn test_world_accumulates_root_first() {
    let mut graph = EntityGraph::new();
    let root = graph.insert(SceneEntity::empty("root")
        .with_transform(Vec3::ZERO, Quat::IDENTITY, Vec3::splat(2.0)));
    let mid = graph.insert(translated("mid", Vec3::X));
    let leaf = graph.insert(translated("leaf", Vec3::Y));
    graph.add_child(root, mid).unwrap();
    graph.add_child(mid, leaf).unwrap();

    let root_local = graph.entity(root).unwrap().local();
    let mid_local = graph.entity(mid).unwrap().local();
    let leaf_local = graph.entity(leaf).unwrap().local();

    assert_eq!(graph.world(leaf).unwrap(), root_local * mid_local);
    assert_eq!(graph.world_transform(leaf).unwrap(), root_local * mid_local * leaf_local);

    // The scale of root applies to the mid translation
    let origin = graph.world_transform(leaf).unwrap().transform_point3(Vec3::ZERO);
    assert_eq!(origin, Vec3::new(2.0, 2.0, 0.0));
}

#[test]
fn test_world_follows_first_parent_only() {
    let mut graph = EntityGraph::new();
    let first = graph.insert(translated("first", Vec3::X));
    let second = graph.insert(translated("second", Vec3::Y));
    let child = graph.insert(SceneEntity::empty("child"));
    graph.add_child(first, child).unwrap();
    graph.add_child(second, child).unwrap();

    assert_eq!(graph.world(child).unwrap(), Mat4::from_translation(Vec3::X));
}

#[test]
fn test_world_uses_last_updated_local() {
    let mut graph = EntityGraph::new();
    let parent = graph.insert(SceneEntity::empty("p"));
    let child = graph.insert(SceneEntity::empty("c"));
    graph.add_child(parent, child).unwrap();

    graph.entity_mut(parent).unwrap().set_position(Vec3::Z);
    assert_eq!(graph.world(child).unwrap(), Mat4::IDENTITY);

    let time = GameTime::new(Duration::ZERO, Duration::ZERO);
    graph.entity_mut(parent).unwrap().update(&time).unwrap();
    assert_eq!(graph.world(child).unwrap(), Mat4::from_translation(Vec3::Z));
}

// ============================================================================
// Tests: Clone
// ============================================================================

#[test]
fn test_clone_entity_is_orphan() {
    let mut graph = EntityGraph::new();
    let parent = graph.insert(SceneEntity::empty("p"));
    let child = graph.insert(translated("c", Vec3::X));
    graph.add_child(parent, child).unwrap();

    let copy = graph.clone_entity(child).unwrap();
    assert_ne!(copy, child);
    let copied = graph.entity(copy).unwrap();
    assert_eq!(copied.key(), copy);
    assert_eq!(copied.position(), Vec3::X);
    assert!(copied.parents().is_empty());
    assert!(!copied.is_linked());
    assert_eq!(graph.entity(parent).unwrap().children(), &[child]);
}
