/// Node tree — single-parent hierarchy used to group and edit content.
///
/// Unlike the entity graph, a node has at most one parent and re-parenting
/// is never silent: a node must be removed from its parent before it can be
/// added elsewhere. Entity nodes mirror the name and transform of a scene
/// entity at creation time.

use glam::{Quat, Vec3};
use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};
use crate::{engine_bail, engine_err, engine_trace};
use crate::logic::EngineComponent;
use super::entity_graph::EntityGraph;
use super::scene_entity::EntityKey;

new_key_type! {
    /// Stable key of a node inside a `NodeTree`
    pub struct NodeKey;
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    /// Entity mirrored by this node, for entity nodes
    entity: Option<EntityKey>,
    disposed: bool,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            parent: None,
            children: Vec::new(),
            entity: None,
            disposed: false,
        }
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn entity(&self) -> Option<EntityKey> {
        self.entity
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl EngineComponent for Node {
    fn dispose(&mut self) {
        self.entity = None;
        self.disposed = true;
    }
}

#[derive(Debug, Default)]
pub struct NodeTree {
    nodes: SlotMap<NodeKey, Node>,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detached node
    pub fn insert(&mut self, mut node: Node) -> NodeKey {
        node.parent = None;
        node.children.clear();
        self.nodes.insert(node)
    }

    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes without a parent
    pub fn roots(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.nodes.iter().filter(|(_, n)| n.parent.is_none()).map(|(k, _)| k)
    }

    fn node(&self, key: NodeKey) -> Result<&Node> {
        self.nodes.get(key).ok_or_else(|| engine_err!("carbon::NodeTree",
            Error::InvalidArgument(format!("Node {:?} is null", key))))
    }

    // ===== HIERARCHY =====

    /// Attach `child` under `parent`.
    ///
    /// Fails if either node is null, if `child` already has a parent or is
    /// already a child of `parent`, or if `parent == child`.
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        self.node(parent)?;
        let child_node = self.node(child)?;

        if parent == child {
            engine_bail!("carbon::NodeTree", Error::InvalidArgument(format!(
                "Node '{}' cannot be its own child", child_node.name)));
        }
        if self.nodes[parent].children.contains(&child) {
            engine_bail!("carbon::NodeTree", Error::InvalidArgument(format!(
                "Node '{}' is already a child of '{}'", child_node.name, self.nodes[parent].name)));
        }
        if let Some(current) = child_node.parent {
            let current_name = self.nodes.get(current).map_or("?", |n| n.name.as_str());
            engine_bail!("carbon::NodeTree", Error::InvalidArgument(format!(
                "Node '{}' already has parent '{}'", child_node.name, current_name)));
        }
        if self.is_ancestor(child, parent) {
            engine_bail!("carbon::NodeTree", Error::InvalidArgument(format!(
                "Attaching '{}' under '{}' would create a cycle",
                child_node.name, self.nodes[parent].name)));
        }

        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        Ok(())
    }

    /// Detach `child` from `parent`. Fails if it is not a current child.
    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        self.node(parent)?;
        self.node(child)?;

        if !self.nodes[parent].children.contains(&child) {
            engine_bail!("carbon::NodeTree", Error::InvalidArgument(format!(
                "Node '{}' is not a child of '{}'", self.nodes[child].name, self.nodes[parent].name)));
        }

        self.nodes[parent].children.retain(|k| *k != child);
        self.nodes[child].parent = None;
        Ok(())
    }

    fn is_ancestor(&self, candidate: NodeKey, of: NodeKey) -> bool {
        let mut current = Some(of);
        while let Some(key) = current {
            if key == candidate {
                return true;
            }
            current = self.nodes.get(key).and_then(|n| n.parent);
        }
        false
    }

    /// Dispose every descendant of `key` depth-first and empty its child set.
    ///
    /// Returns the number of nodes disposed.
    pub fn clear(&mut self, key: NodeKey) -> Result<usize> {
        self.node(key)?;
        let children = std::mem::take(&mut self.nodes[key].children);
        let mut disposed = 0;
        for child in children {
            disposed += self.dispose_subtree(child);
        }
        Ok(disposed)
    }

    /// Descendants first, then `key` itself. Walks with an explicit stack so
    /// hierarchy depth is not bounded by the call stack.
    fn dispose_subtree(&mut self, key: NodeKey) -> usize {
        let mut pending = vec![key];
        let mut order = Vec::new();
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(current) {
                pending.extend(std::mem::take(&mut node.children));
                order.push(current);
            }
        }

        let mut disposed = 0;
        for current in order.into_iter().rev() {
            if let Some(mut node) = self.nodes.remove(current) {
                node.dispose();
                engine_trace!("carbon::NodeTree", "Disposed node '{}'", node.name);
                disposed += 1;
            }
        }
        disposed
    }

    /// Clear `key`, detach it from its parent, and remove it
    pub fn dispose(&mut self, key: NodeKey) -> Result<Node> {
        self.clear(key)?;
        if let Some(parent) = self.nodes[key].parent {
            self.remove_child(parent, key)?;
        }
        let mut node = self.nodes.remove(key).ok_or_else(|| engine_err!("carbon::NodeTree",
            Error::InvalidArgument(format!("Node {:?} is null", key))))?;
        node.dispose();
        Ok(node)
    }

    // ===== ENTITY NODES =====

    /// Create a detached node mirroring `entity`'s name and transform
    pub fn create_entity_node(&mut self, graph: &EntityGraph, entity: EntityKey) -> Result<NodeKey> {
        let source = graph.entity(entity)?;
        let mut node = Node::new(source.name());
        node.entity = Some(entity);
        node.position = source.position();
        node.rotation = source.rotation();
        node.scale = source.scale();
        Ok(self.insert(node))
    }

    /// Copy the mirrored entity's transform back into the node
    pub fn reset_transformations(&mut self, key: NodeKey, graph: &EntityGraph) -> Result<()> {
        let entity = self.node(key)?.entity.ok_or_else(|| engine_err!("carbon::NodeTree",
            Error::InvalidOperation(format!("Node '{}' is not an entity node", self.nodes[key].name))))?;
        let source = graph.entity(entity)?;

        let node = &mut self.nodes[key];
        node.position = source.position();
        node.rotation = source.rotation();
        node.scale = source.scale();
        Ok(())
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
