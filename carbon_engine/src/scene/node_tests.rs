/// Tests for NodeTree

use super::*;
use crate::scene::SceneEntity;

fn tree_with(names: &[&str]) -> (NodeTree, Vec<NodeKey>) {
    let mut tree = NodeTree::new();
    let keys = names.iter().map(|n| tree.insert(Node::new(*n))).collect();
    (tree, keys)
}

// ============================================================================
// Tests: add_child / remove_child
// ============================================================================

#[test]
fn test_add_remove_child_round_trip() {
    let (mut tree, keys) = tree_with(&["root", "existing", "child"]);
    let (root, existing, child) = (keys[0], keys[1], keys[2]);
    tree.add_child(root, existing).unwrap();
    let before = tree.get(root).unwrap().children().to_vec();

    tree.add_child(root, child).unwrap();
    assert_eq!(tree.get(child).unwrap().parent(), Some(root));

    tree.remove_child(root, child).unwrap();
    assert_eq!(tree.get(child).unwrap().parent(), None);
    assert_eq!(tree.get(root).unwrap().children(), before.as_slice());
}

#[test]
fn test_add_child_rejects_null() {
    let (mut tree, keys) = tree_with(&["root", "gone"]);
    tree.dispose(keys[1]).unwrap();
    assert!(matches!(tree.add_child(keys[0], keys[1]), Err(Error::InvalidArgument(_))));
    assert!(matches!(tree.add_child(keys[1], keys[0]), Err(Error::InvalidArgument(_))));
}

#[test]
fn test_add_child_rejects_already_parented() {
    let (mut tree, keys) = tree_with(&["a", "b", "child"]);
    tree.add_child(keys[0], keys[2]).unwrap();
    assert!(matches!(tree.add_child(keys[1], keys[2]), Err(Error::InvalidArgument(_))));
    // No silent re-parenting
    assert_eq!(tree.get(keys[2]).unwrap().parent(), Some(keys[0]));
}

#[test]
fn test_add_child_rejects_duplicate_and_self() {
    let (mut tree, keys) = tree_with(&["a", "b"]);
    tree.add_child(keys[0], keys[1]).unwrap();
    assert!(tree.add_child(keys[0], keys[1]).is_err());
    assert!(tree.add_child(keys[0], keys[0]).is_err());
    assert_eq!(tree.get(keys[0]).unwrap().children().len(), 1);
}

#[test]
fn test_add_child_rejects_cycle() {
    let (mut tree, keys) = tree_with(&["a", "b"]);
    tree.add_child(keys[0], keys[1]).unwrap();
    assert!(tree.add_child(keys[1], keys[0]).is_err());
}

#[test]
fn test_remove_non_child_fails() {
    let (mut tree, keys) = tree_with(&["a", "b"]);
    assert!(matches!(tree.remove_child(keys[0], keys[1]), Err(Error::InvalidArgument(_))));
}

// ============================================================================
// Tests: clear / dispose
// ============================================================================

#[test]
fn test_clear_disposes_all_descendants() {
    let (mut tree, keys) = tree_with(&["root", "a", "b", "a1", "a2"]);
    let (root, a, b, a1, a2) = (keys[0], keys[1], keys[2], keys[3], keys[4]);
    tree.add_child(root, a).unwrap();
    tree.add_child(root, b).unwrap();
    tree.add_child(a, a1).unwrap();
    tree.add_child(a, a2).unwrap();

    assert_eq!(tree.clear(root).unwrap(), 4);
    assert!(tree.get(root).unwrap().children().is_empty());
    assert_eq!(tree.len(), 1);
    for key in [a, b, a1, a2] {
        assert!(!tree.contains(key));
    }
}

#[test]
fn test_clear_handles_deep_hierarchy() {
    let mut tree = NodeTree::new();
    let root = tree.insert(Node::new("root"));
    let chain: Vec<NodeKey> = (0..100_000).map(|i| tree.insert(Node::new(format!("n{}", i)))).collect();
    // Attach bottom-up so each parent is still a root when it gains its child
    for pair in chain.windows(2).rev() {
        tree.add_child(pair[0], pair[1]).unwrap();
    }
    tree.add_child(root, chain[0]).unwrap();

    assert_eq!(tree.clear(root).unwrap(), 100_000);
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_dispose_detaches_from_parent() {
    let (mut tree, keys) = tree_with(&["root", "a", "a1"]);
    tree.add_child(keys[0], keys[1]).unwrap();
    tree.add_child(keys[1], keys[2]).unwrap();

    let node = tree.dispose(keys[1]).unwrap();
    assert!(node.is_disposed());
    assert!(tree.get(keys[0]).unwrap().children().is_empty());
    assert!(!tree.contains(keys[2]));
    assert_eq!(tree.roots().collect::<Vec<_>>(), vec![keys[0]]);
}

// ============================================================================
// Tests: entity nodes
// ============================================================================

#[test]
fn test_entity_node_mirrors_entity() {
    let mut graph = EntityGraph::new();
    let entity = graph.insert(SceneEntity::empty("crate")
        .with_transform(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_z(0.5), Vec3::splat(2.0)));

    let mut tree = NodeTree::new();
    let key = tree.create_entity_node(&graph, entity).unwrap();
    let node = tree.get(key).unwrap();
    assert_eq!(node.name, "crate");
    assert_eq!(node.entity(), Some(entity));
    assert_eq!(node.position, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(node.scale, Vec3::splat(2.0));
}

#[test]
fn test_reset_transformations_recopies() {
    let mut graph = EntityGraph::new();
    let entity = graph.insert(SceneEntity::empty("crate"));
    let mut tree = NodeTree::new();
    let key = tree.create_entity_node(&graph, entity).unwrap();

    tree.get_mut(key).unwrap().position = Vec3::splat(9.0);
    graph.entity_mut(entity).unwrap().set_position(Vec3::X);
    tree.reset_transformations(key, &graph).unwrap();

    assert_eq!(tree.get(key).unwrap().position, Vec3::X);
}

#[test]
fn test_reset_transformations_on_plain_node_fails() {
    let (mut tree, keys) = tree_with(&["plain"]);
    let graph = EntityGraph::new();
    assert!(matches!(tree.reset_transformations(keys[0], &graph), Err(Error::InvalidOperation(_))));
}
