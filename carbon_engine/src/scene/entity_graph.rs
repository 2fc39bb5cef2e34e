/// EntityGraph — arena of scene entities and their parent/child edges.
///
/// Edges are stored on both ends (`parents` on the child, `children` on the
/// parent) and kept symmetric by every mutation. Cycles and self-edges are
/// rejected, so traversals always terminate.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use glam::Mat4;
use rustc_hash::FxHashSet;
use slotmap::SlotMap;
use crate::error::{Error, Result};
use crate::{engine_bail, engine_debug, engine_err};
use super::scene_entity::{EntityKey, SceneEntity};

/// Entity graph shared between the scenes that link into it
pub type SharedEntityGraph = Arc<RwLock<EntityGraph>>;

#[derive(Debug, Default)]
pub struct EntityGraph {
    entities: SlotMap<EntityKey, SceneEntity>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph behind a shared lock
    pub fn shared() -> SharedEntityGraph {
        Arc::new(RwLock::new(Self::new()))
    }

    // ===== ARENA =====

    /// Move an entity into the graph. Any edges or link it carried are dropped.
    pub fn insert(&mut self, mut entity: SceneEntity) -> EntityKey {
        entity.parents.clear();
        entity.children.clear();
        entity.clear_link();
        self.entities.insert_with_key(|key| {
            entity.set_key(key);
            entity
        })
    }

    /// Remove an entity and every edge touching it.
    ///
    /// The removed entity is returned orphaned. A linked entity must be
    /// unlinked from its scene first.
    pub fn remove(&mut self, key: EntityKey) -> Result<SceneEntity> {
        let entity = self.entity(key)?;
        if let Some(link) = entity.link() {
            engine_bail!("carbon::EntityGraph", Error::InvalidOperation(format!(
                "Entity '{}' is still linked to scene '{}'", entity.name(), link.scene_name())));
        }

        let parents = entity.parents.clone();
        let children = entity.children.clone();
        for parent in parents {
            if let Some(p) = self.entities.get_mut(parent) {
                p.children.retain(|k| *k != key);
            }
        }
        for child in children {
            if let Some(c) = self.entities.get_mut(child) {
                c.parents.retain(|k| *k != key);
            }
        }

        let mut removed = self.entities.remove(key).ok_or_else(|| Self::missing(key))?;
        removed.parents.clear();
        removed.children.clear();
        Ok(removed)
    }

    pub fn get(&self, key: EntityKey) -> Option<&SceneEntity> {
        self.entities.get(key)
    }

    pub fn get_mut(&mut self, key: EntityKey) -> Option<&mut SceneEntity> {
        self.entities.get_mut(key)
    }

    /// Like `get`, but a dead key is an `InvalidArgument` error
    pub fn entity(&self, key: EntityKey) -> Result<&SceneEntity> {
        self.entities.get(key).ok_or_else(|| Self::missing(key))
    }

    /// Like `get_mut`, but a dead key is an `InvalidArgument` error
    pub fn entity_mut(&mut self, key: EntityKey) -> Result<&mut SceneEntity> {
        self.entities.get_mut(key).ok_or_else(|| Self::missing(key))
    }

    pub fn contains(&self, key: EntityKey) -> bool {
        self.entities.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = EntityKey> + '_ {
        self.entities.keys()
    }

    pub(crate) fn entities_mut(&mut self) -> &mut SlotMap<EntityKey, SceneEntity> {
        &mut self.entities
    }

    fn missing(key: EntityKey) -> Error {
        engine_err!("carbon::EntityGraph",
            Error::InvalidArgument(format!("Entity {:?} does not exist", key)))
    }

    // ===== EDGES =====

    /// Make `child` a child of `parent` (and `parent` a parent of `child`)
    pub fn add_child(&mut self, parent: EntityKey, child: EntityKey) -> Result<()> {
        self.entity(parent)?;
        self.entity(child)?;

        if parent == child {
            engine_bail!("carbon::EntityGraph", Error::InvalidArgument(
                "An entity cannot be its own child".to_string()));
        }
        if self.entities[child].parents.contains(&parent) {
            engine_bail!("carbon::EntityGraph", Error::InvalidArgument(format!(
                "Entity '{}' is already a child of '{}'",
                self.entities[child].name(), self.entities[parent].name())));
        }
        if self.is_ancestor(child, parent) {
            engine_bail!("carbon::EntityGraph", Error::InvalidArgument(format!(
                "Linking '{}' under '{}' would create a cycle",
                self.entities[child].name(), self.entities[parent].name())));
        }

        self.entities[parent].children.push(child);
        self.entities[child].parents.push(parent);
        self.entities[child].invalidate();
        Ok(())
    }

    /// Same edge as `add_child`, stated from the child's side
    pub fn add_parent(&mut self, child: EntityKey, parent: EntityKey) -> Result<()> {
        self.add_child(parent, child)
    }

    /// Remove the `parent` -> `child` edge on both ends
    pub fn remove_child(&mut self, parent: EntityKey, child: EntityKey) -> Result<()> {
        self.entity(parent)?;
        self.entity(child)?;

        if !self.entities[parent].children.contains(&child) {
            engine_bail!("carbon::EntityGraph", Error::InvalidArgument(format!(
                "Entity '{}' is not a child of '{}'",
                self.entities[child].name(), self.entities[parent].name())));
        }

        self.entities[parent].children.retain(|k| *k != child);
        self.entities[child].parents.retain(|k| *k != parent);
        self.entities[child].invalidate();
        Ok(())
    }

    pub fn remove_parent(&mut self, child: EntityKey, parent: EntityKey) -> Result<()> {
        self.remove_child(parent, child)
    }

    /// Whether `candidate` is `of` or reachable from `of` through parent edges
    pub fn is_ancestor(&self, candidate: EntityKey, of: EntityKey) -> bool {
        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::new();
        queue.push_back(of);
        while let Some(current) = queue.pop_front() {
            if current == candidate {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(entity) = self.entities.get(current) {
                queue.extend(entity.parents.iter().copied());
            }
        }
        false
    }

    /// `root` followed by every entity reachable through child edges,
    /// breadth-first, each listed once
    pub fn subtree(&self, root: EntityKey) -> Result<Vec<EntityKey>> {
        self.entity(root)?;
        let mut visited = FxHashSet::default();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(root);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            order.push(current);
            if let Some(entity) = self.entities.get(current) {
                queue.extend(entity.children.iter().copied());
            }
        }
        Ok(order)
    }

    // ===== CLONE =====

    /// Insert an orphan, unlinked copy of `key`
    pub fn clone_entity(&mut self, key: EntityKey) -> Result<EntityKey> {
        let copy = self.entity(key)?.clone_detached();
        Ok(self.insert(copy))
    }

    // ===== TRANSFORMS =====

    /// Accumulated transform of the ancestors of `key`:
    /// `root.local * ... * parent.local`, identity for an orphan.
    ///
    /// Only the first parent of each entity is followed.
    pub fn world(&self, key: EntityKey) -> Result<Mat4> {
        self.entity(key)?;

        let mut locals: Vec<Mat4> = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(key);
        while let Some(current) = queue.pop_front() {
            let Some(entity) = self.entities.get(current) else { continue };
            if let Some(&parent) = entity.parents.first() {
                if entity.parents.len() > 1 {
                    engine_debug!("carbon::EntityGraph",
                        "Entity '{}' has {} parents, world follows the first only",
                        entity.name(), entity.parents.len());
                }
                if let Some(p) = self.entities.get(parent) {
                    locals.push(p.local());
                    queue.push_back(parent);
                }
            }
        }

        let mut world = Mat4::IDENTITY;
        while let Some(local) = locals.pop() {
            world *= local;
        }
        Ok(world)
    }

    /// `world(key) * local(key)`
    pub fn world_transform(&self, key: EntityKey) -> Result<Mat4> {
        let world = self.world(key)?;
        Ok(world * self.entities[key].local())
    }
}

#[cfg(test)]
#[path = "entity_graph_tests.rs"]
mod tests;
