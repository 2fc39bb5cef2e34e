/// SceneEntity — the positionable, renderable unit of a scene.
///
/// Entities live in an `EntityGraph` arena and are addressed by
/// `EntityKey`. The local matrix is recomputed lazily in `update`; any
/// transform change on a linked entity pushes the entity back into its
/// owning scene's invalidation bucket so the next scene update recomputes it.

use std::sync::{Arc, Mutex, Weak};
use glam::{Mat4, Quat, Vec3};
use slotmap::{new_key_type, Key};
use crate::error::{Error, Result};
use crate::engine_err;
use crate::logic::{EngineComponent, GameTime};
use crate::services::{ContentHash, FrameInstruction, FrameInstructionSet};
use super::bounds::{AABB, BoundingSphere};
use super::buckets::InvalidationBuckets;

new_key_type! {
    /// Stable, generation-checked key of an entity inside an `EntityGraph`
    pub struct EntityKey;
}

/// Id of an invalidation bucket inside a scene
pub type BucketId = i32;

/// Bucket used when the caller does not name one
pub const DEFAULT_BUCKET: BucketId = 1;

// ===== LINK =====

/// Back-reference from an entity to the scene it is linked to.
///
/// Holds only a weak handle on the scene's buckets: a linked entity never
/// keeps its scene alive.
#[derive(Debug, Clone)]
pub struct EntityLink {
    scene: Arc<str>,
    bucket: BucketId,
    buckets: Weak<Mutex<InvalidationBuckets>>,
}

impl EntityLink {
    pub(crate) fn new(
        scene: Arc<str>,
        bucket: BucketId,
        buckets: Weak<Mutex<InvalidationBuckets>>,
    ) -> Self {
        Self { scene, bucket, buckets }
    }

    /// Name of the owning scene
    pub fn scene_name(&self) -> &str {
        &self.scene
    }

    /// Bucket the entity was linked under
    pub fn bucket(&self) -> BucketId {
        self.bucket
    }

    /// Whether this link points at `buckets`
    pub(crate) fn belongs_to(&self, buckets: &Arc<Mutex<InvalidationBuckets>>) -> bool {
        std::ptr::eq(self.buckets.as_ptr(), Arc::as_ptr(buckets))
    }

    /// Queue `key` in the owning scene's bucket. No-op once the scene is gone.
    fn invalidate(&self, key: EntityKey) {
        if let Some(buckets) = self.buckets.upgrade() {
            if let Ok(mut buckets) = buckets.lock() {
                buckets.push_update(self.bucket, key);
            }
        }
    }
}

// ===== KINDS =====

/// Mesh content referenced by a model, with the bounds read from it
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRef {
    pub hash: ContentHash,
    pub bounding_box: Option<AABB>,
    pub bounding_sphere: Option<BoundingSphere>,
}

impl MeshRef {
    pub fn new(hash: impl Into<ContentHash>) -> Self {
        Self { hash: hash.into(), bounding_box: None, bounding_sphere: None }
    }

    pub fn with_bounding_box(mut self, bounding_box: AABB) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    pub fn with_bounding_sphere(mut self, bounding_sphere: BoundingSphere) -> Self {
        self.bounding_sphere = Some(bounding_sphere);
        self
    }
}

/// Renderable model state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelEntity {
    pub mesh: Option<MeshRef>,
    pub material: Option<ContentHash>,
}

/// Camera parameters; the camera follows the entity transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraEntity {
    /// Vertical field of view in radians
    pub field_of_view: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraEntity {
    /// Right-handed perspective projection for the given aspect ratio
    pub fn projection(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(self.field_of_view, aspect_ratio, self.near, self.far)
    }
}

impl Default for CameraEntity {
    fn default() -> Self {
        Self { field_of_view: std::f32::consts::FRAC_PI_4, near: 0.1, far: 1000.0 }
    }
}

/// Point light parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightEntity {
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
}

impl Default for LightEntity {
    fn default() -> Self {
        Self { color: Vec3::ONE, intensity: 1.0, range: 10.0 }
    }
}

/// Subtype-specific entity state
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    /// Pure transform (grouping, anchors)
    Empty,
    Model(ModelEntity),
    Camera(CameraEntity),
    Light(LightEntity),
}

// ===== ENTITY =====

/// A positionable graph node, owned by at most one scene at a time
#[derive(Debug)]
pub struct SceneEntity {
    key: EntityKey,
    name: String,
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    local: Mat4,
    local_dirty: bool,
    /// Unscaled bounds set by the user; they win over the mesh's own bounds
    explicit_bounding_box: Option<AABB>,
    explicit_bounding_sphere: Option<BoundingSphere>,
    bounding_box: Option<AABB>,
    bounding_sphere: Option<BoundingSphere>,
    bounds_dirty: bool,
    pub(crate) parents: Vec<EntityKey>,
    pub(crate) children: Vec<EntityKey>,
    link: Option<EntityLink>,
    kind: EntityKind,
}

impl SceneEntity {
    /// Create an entity at the origin with identity rotation and unit scale
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            key: EntityKey::null(),
            name: name.into(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local: Mat4::IDENTITY,
            local_dirty: false,
            explicit_bounding_box: None,
            explicit_bounding_sphere: None,
            bounding_box: None,
            bounding_sphere: None,
            bounds_dirty: true,
            parents: Vec::new(),
            children: Vec::new(),
            link: None,
            kind,
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, EntityKind::Empty)
    }

    pub fn model(name: impl Into<String>, mesh: Option<MeshRef>) -> Self {
        Self::new(name, EntityKind::Model(ModelEntity { mesh, material: None }))
    }

    pub fn camera(name: impl Into<String>, camera: CameraEntity) -> Self {
        Self::new(name, EntityKind::Camera(camera))
    }

    pub fn light(name: impl Into<String>, light: LightEntity) -> Self {
        Self::new(name, EntityKind::Light(light))
    }

    /// Builder: initial transform, applied to the local matrix immediately
    pub fn with_transform(mut self, position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        self.position = position;
        self.rotation = rotation;
        self.scale = scale;
        self.local = Self::compose_local(scale, rotation, position);
        self.bounds_dirty = true;
        self
    }

    fn compose_local(scale: Vec3, rotation: Quat, position: Vec3) -> Mat4 {
        Mat4::from_scale_rotation_translation(scale, rotation, position)
    }

    // ===== GETTERS =====

    /// Key inside the owning graph (`EntityKey::null()` before insertion)
    pub fn key(&self) -> EntityKey {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Local matrix as of the last update
    pub fn local(&self) -> Mat4 {
        self.local
    }

    /// Whether the local matrix is waiting for the next update
    pub fn is_local_dirty(&self) -> bool {
        self.local_dirty
    }

    /// Effective (scaled) bounding box as of the last update
    pub fn bounding_box(&self) -> Option<AABB> {
        self.bounding_box
    }

    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        self.bounding_sphere
    }

    pub fn parents(&self) -> &[EntityKey] {
        &self.parents
    }

    pub fn children(&self) -> &[EntityKey] {
        &self.children
    }

    pub fn link(&self) -> Option<&EntityLink> {
        self.link.as_ref()
    }

    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Only models with a mesh go into render lists
    pub fn can_render(&self) -> bool {
        matches!(&self.kind, EntityKind::Model(model) if model.mesh.is_some())
    }

    // ===== MUTATION =====

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_position(&mut self, position: Vec3) {
        if self.position != position {
            self.position = position;
            self.mark_local_dirty();
        }
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        if self.rotation != rotation {
            self.rotation = rotation;
            self.mark_local_dirty();
        }
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        if self.scale != scale {
            self.scale = scale;
            self.bounds_dirty = true;
            self.mark_local_dirty();
        }
    }

    /// Override the unscaled bounding box. `None` falls back to the mesh bounds.
    pub fn set_bounding_box(&mut self, bounding_box: Option<AABB>) {
        self.explicit_bounding_box = bounding_box;
        self.bounds_dirty = true;
        self.invalidate();
    }

    /// Override the unscaled bounding sphere. `None` falls back to the mesh bounds.
    pub fn set_bounding_sphere(&mut self, bounding_sphere: Option<BoundingSphere>) {
        self.explicit_bounding_sphere = bounding_sphere;
        self.bounds_dirty = true;
        self.invalidate();
    }

    /// Swap the mesh of a model entity. Bounds follow the mesh on next update.
    pub fn set_mesh(&mut self, mesh: Option<MeshRef>) -> Result<()> {
        match &mut self.kind {
            EntityKind::Model(model) => {
                if model.mesh != mesh {
                    model.mesh = mesh;
                    self.bounds_dirty = true;
                    self.invalidate();
                }
                Ok(())
            }
            _ => Err(engine_err!("carbon::SceneEntity",
                Error::InvalidArgument(format!("Entity '{}' is not a model", self.name)))),
        }
    }

    pub fn set_material(&mut self, material: Option<ContentHash>) -> Result<()> {
        match &mut self.kind {
            EntityKind::Model(model) => {
                model.material = material;
                Ok(())
            }
            _ => Err(engine_err!("carbon::SceneEntity",
                Error::InvalidArgument(format!("Entity '{}' is not a model", self.name)))),
        }
    }

    /// Unscaled box: the override if set, the mesh's otherwise
    fn base_bounding_box(&self) -> Option<AABB> {
        let mesh = match &self.kind {
            EntityKind::Model(model) => model.mesh.as_ref(),
            _ => None,
        };
        self.explicit_bounding_box.or_else(|| mesh.and_then(|m| m.bounding_box))
    }

    fn mark_local_dirty(&mut self) {
        self.local_dirty = true;
        self.invalidate();
    }

    /// Re-queue this entity in its owning scene, if linked
    pub fn invalidate(&self) {
        if let Some(link) = &self.link {
            link.invalidate(self.key);
        }
    }

    // ===== LINKING =====

    /// Attach this entity to a scene bucket. Fails if already linked.
    pub fn link_to(&mut self, link: EntityLink) -> Result<()> {
        if let Some(existing) = &self.link {
            return Err(engine_err!("carbon::SceneEntity",
                Error::InvalidOperation(format!(
                    "Entity '{}' is already linked to scene '{}'",
                    self.name, existing.scene_name()))));
        }
        self.link = Some(link);
        Ok(())
    }

    /// Detach this entity from its scene. Fails if not linked.
    pub fn unlink(&mut self) -> Result<EntityLink> {
        self.link.take().ok_or_else(|| engine_err!("carbon::SceneEntity",
            Error::InvalidOperation(format!("Entity '{}' is not linked", self.name))))
    }

    // ===== CLONE / RENDER =====

    /// Copy name, transform, bounds, and kind into an orphan, unlinked entity.
    ///
    /// Parent/child edges are never copied.
    pub fn clone_detached(&self) -> SceneEntity {
        SceneEntity {
            key: EntityKey::null(),
            name: self.name.clone(),
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
            local: self.local,
            local_dirty: self.local_dirty,
            explicit_bounding_box: self.explicit_bounding_box,
            explicit_bounding_sphere: self.explicit_bounding_sphere,
            bounding_box: self.bounding_box,
            bounding_sphere: self.bounding_sphere,
            bounds_dirty: self.bounds_dirty,
            parents: Vec::new(),
            children: Vec::new(),
            link: None,
            kind: self.kind.clone(),
        }
    }

    /// Emit draw instructions for this entity with the given world transform
    pub fn render(&self, set: &mut FrameInstructionSet, world: Mat4) {
        if let EntityKind::Model(ModelEntity { mesh: Some(mesh), material }) = &self.kind {
            set.instructions.push(FrameInstruction {
                entity: self.key,
                mesh: mesh.hash.clone(),
                material: material.clone(),
                world,
                world_bounds: self.base_bounding_box().map(|b| b.transformed(&world)),
            });
        }
    }

    pub(crate) fn clear_link(&mut self) {
        self.link = None;
    }

    pub(crate) fn set_key(&mut self, key: EntityKey) {
        self.key = key;
    }
}

impl EngineComponent for SceneEntity {
    /// Recompute stale bounds and the local matrix
    fn update(&mut self, _time: &GameTime) -> Result<bool> {
        if self.bounds_dirty {
            let mesh = match &self.kind {
                EntityKind::Model(model) => model.mesh.as_ref(),
                _ => None,
            };
            let base_sphere = self.explicit_bounding_sphere
                .or_else(|| mesh.and_then(|m| m.bounding_sphere));
            self.bounding_box = self.base_bounding_box().map(|b| b.scaled(self.scale));
            self.bounding_sphere = base_sphere.map(|s| s.scaled(self.scale));
            self.bounds_dirty = false;
        }

        if self.local_dirty {
            self.local = Self::compose_local(self.scale, self.rotation, self.position);
            self.local_dirty = false;
        }

        Ok(true)
    }

    fn unload(&mut self) {
        self.link = None;
    }
}

#[cfg(test)]
#[path = "scene_entity_tests.rs"]
mod tests;
