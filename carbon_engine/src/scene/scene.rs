/// Scene — a set of linked entities with update buckets and render lists.
///
/// A scene does not own its entities: they live in a shared `EntityGraph`
/// and the scene keeps keys. Linked entities push themselves into the
/// scene's invalidation buckets when their transform changes; `update`
/// drains the buckets in ascending id order.
///
/// Scene-specific hooks (initialize, resize, render, activate, deactivate)
/// come from an injected `SceneBehavior`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLockReadGuard};
use glam::UVec2;
use crate::error::{Error, Result};
use crate::{engine_bail, engine_debug, engine_err, engine_info, engine_warn};
use crate::logic::{EngineComponent, GameTime};
use crate::services::{
    ContentHash, ContentProvider, ContentProviderExt, FrameInstructionSet, FrameManager,
    GraphicsProvider, ScriptHost, ScriptResource, ScriptRuntime, SCRIPT_UPDATE_HOOK,
};
use super::buckets::InvalidationBuckets;
use super::entity_graph::{EntityGraph, SharedEntityGraph};
use super::scene_entity::{BucketId, EntityKey, EntityLink};

/// Id a scene is registered under in the `SceneManager`
pub type SceneId = i32;

/// Id of a render list inside a scene
pub type RenderListId = i32;

/// Render list used when the caller does not name one
pub const DEFAULT_RENDER_LIST: RenderListId = 1;

// ===== BEHAVIOR =====

/// Read-only view handed to `SceneBehavior::render`
pub struct SceneRenderContext<'a> {
    scene_name: &'a str,
    graph: &'a EntityGraph,
    render_lists: &'a BTreeMap<RenderListId, Vec<EntityKey>>,
}

impl<'a> SceneRenderContext<'a> {
    pub fn scene_name(&self) -> &str {
        self.scene_name
    }

    pub fn graph(&self) -> &EntityGraph {
        self.graph
    }

    /// Ids of every render list, ascending
    pub fn list_ids(&self) -> impl Iterator<Item = RenderListId> + '_ {
        self.render_lists.keys().copied()
    }

    /// Render every entity of `list` into `set`.
    ///
    /// A missing list logs a warning and renders nothing. Entities destroyed
    /// since they were listed are skipped.
    pub fn render_list(&self, list: RenderListId, set: &mut FrameInstructionSet) {
        let Some(keys) = self.render_lists.get(&list) else {
            engine_warn!("carbon::Scene",
                "Scene '{}': render list {} does not exist", self.scene_name, list);
            return;
        };

        for &key in keys {
            let Some(entity) = self.graph.get(key) else { continue };
            match self.graph.world_transform(key) {
                Ok(world) => entity.render(set, world),
                Err(_) => continue,
            }
        }
    }
}

/// Render every list in ascending id order into a single instruction set
pub fn render_all_lists(ctx: &SceneRenderContext<'_>, frame_manager: &mut dyn FrameManager) {
    let mut set = frame_manager.begin_set();
    for list in ctx.list_ids() {
        ctx.render_list(list, &mut set);
    }
    frame_manager.render_set(set);
}

/// Scene-specific hooks. Every method has a default.
pub trait SceneBehavior: Send {
    fn initialize(&mut self, _graphics: &dyn GraphicsProvider) -> Result<()> {
        Ok(())
    }

    fn resize(&mut self, _size: UVec2) {}

    /// Called after the scene runtime (if any) is up
    fn activate(&mut self) -> Result<()> {
        Ok(())
    }

    fn deactivate(&mut self) {}

    fn unload(&mut self) {}

    /// Emit the scene's frame. Must not mutate scene state.
    fn render(&self, ctx: &SceneRenderContext<'_>, frame_manager: &mut dyn FrameManager) -> Result<()> {
        render_all_lists(ctx, frame_manager);
        Ok(())
    }
}

/// Behavior with no hooks beyond rendering every list
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSceneBehavior;

impl SceneBehavior for DefaultSceneBehavior {}

// ===== DESCRIPTOR =====

/// Script runtime requirement of a scene, with the collaborators to satisfy it
pub struct SceneRuntimeDesc {
    /// Script content; a requirement without a hash fails `check_state`
    pub script_hash: Option<ContentHash>,
    pub content: Arc<dyn ContentProvider>,
    pub scripts: Arc<dyn ScriptHost>,
}

/// Scene creation descriptor
pub struct SceneDesc {
    pub name: String,
    pub graph: SharedEntityGraph,
    pub behavior: Box<dyn SceneBehavior>,
    pub runtime: Option<SceneRuntimeDesc>,
}

impl SceneDesc {
    /// Descriptor with the default behavior and no runtime
    pub fn new(name: impl Into<String>, graph: SharedEntityGraph) -> Self {
        Self {
            name: name.into(),
            graph,
            behavior: Box::new(DefaultSceneBehavior),
            runtime: None,
        }
    }

    pub fn with_behavior(mut self, behavior: impl SceneBehavior + 'static) -> Self {
        self.behavior = Box::new(behavior);
        self
    }

    pub fn with_runtime(mut self, runtime: SceneRuntimeDesc) -> Self {
        self.runtime = Some(runtime);
        self
    }
}

// ===== SCENE =====

pub struct Scene {
    name: Arc<str>,
    graph: SharedEntityGraph,
    behavior: Box<dyn SceneBehavior>,
    runtime_desc: Option<SceneRuntimeDesc>,
    /// Live script runtime, present only while active
    runtime: Option<Box<dyn ScriptRuntime>>,
    /// Entities linked to this scene, in link order
    entities: Vec<EntityKey>,
    buckets: Arc<Mutex<InvalidationBuckets>>,
    render_lists: BTreeMap<RenderListId, Vec<EntityKey>>,
    initialized: bool,
    active: bool,
    visible: bool,
}

impl Scene {
    pub fn new(desc: SceneDesc) -> Self {
        Self {
            name: Arc::from(desc.name),
            graph: desc.graph,
            behavior: desc.behavior,
            runtime_desc: desc.runtime,
            runtime: None,
            entities: Vec::new(),
            buckets: Arc::new(Mutex::new(InvalidationBuckets::new())),
            render_lists: BTreeMap::new(),
            initialized: false,
            active: false,
            visible: false,
        }
    }

    // ===== ACCESSORS =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &SharedEntityGraph {
        &self.graph
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether a script runtime is currently loaded
    pub fn has_runtime(&self) -> bool {
        self.runtime.is_some()
    }

    /// Entities linked to this scene, in link order
    pub fn linked_entities(&self) -> &[EntityKey] {
        &self.entities
    }

    /// Entities in a render list, `None` if the list was never created
    pub fn render_list(&self, list: RenderListId) -> Option<&[EntityKey]> {
        self.render_lists.get(&list).map(|l| l.as_slice())
    }

    /// Pending (live or dead) update entries in `bucket`
    pub fn pending_updates(&self, bucket: BucketId) -> Result<usize> {
        Ok(self.lock_buckets()?.pending_in(bucket))
    }

    /// How many times `key` is queued in `bucket`
    pub fn pending_update_count_of(&self, bucket: BucketId, key: EntityKey) -> Result<usize> {
        Ok(self.lock_buckets()?.count_in(bucket, key))
    }

    // ===== LOCKS =====

    fn read_graph(&self) -> Result<RwLockReadGuard<'_, EntityGraph>> {
        self.graph.read().map_err(|_| poisoned(&self.name, "entity graph"))
    }

    fn lock_buckets(&self) -> Result<MutexGuard<'_, InvalidationBuckets>> {
        self.buckets.lock().map_err(|_| poisoned(&self.name, "bucket"))
    }

    // ===== STATE =====

    /// Fail when the scene requires a runtime but names no script
    pub fn check_state(&self) -> Result<()> {
        if let Some(runtime) = &self.runtime_desc {
            if runtime.script_hash.is_none() {
                engine_bail!("carbon::Scene", Error::SceneState(format!(
                    "Scene '{}' requires a runtime but has no script", self.name)));
            }
        }
        Ok(())
    }

    /// Activate or deactivate. Hooks run only when the flag changes.
    ///
    /// A failed activation leaves the scene inactive.
    pub fn set_active(&mut self, active: bool) -> Result<()> {
        if self.active == active {
            return Ok(());
        }
        if active {
            self.check_state()?;
            self.activate()?;
            self.active = true;
        } else {
            self.active = false;
            self.deactivate();
        }
        Ok(())
    }

    /// Activate a scene that already passed `check_state` once, e.g. a
    /// suspended scene being promoted. No-op when already active.
    pub(crate) fn resume(&mut self) -> Result<()> {
        if !self.active {
            self.activate()?;
            self.active = true;
        }
        Ok(())
    }

    fn activate(&mut self) -> Result<()> {
        if let Some(desc) = &self.runtime_desc {
            let hash = desc.script_hash.as_ref().ok_or_else(|| engine_err!("carbon::Scene",
                Error::SceneState(format!("Scene '{}' has no script", self.name))))?;

            let script = desc.content.load::<ScriptResource>(hash).ok_or_else(|| {
                engine_err!("carbon::Scene", Error::SceneState(format!(
                    "Scene '{}': runtime was not found for script {}", self.name, hash)))
            })?;

            let runtime = desc.scripts.create_runtime(&script).ok_or_else(|| {
                engine_err!("carbon::Scene", Error::SceneState(format!(
                    "Scene '{}': script host could not load {}", self.name, hash)))
            })?;
            self.runtime = Some(runtime);
        }

        if let Err(err) = self.behavior.activate() {
            self.dispose_runtime();
            return Err(err);
        }

        engine_debug!("carbon::Scene", "Scene '{}' activated", self.name);
        Ok(())
    }

    fn deactivate(&mut self) {
        self.behavior.deactivate();
        self.dispose_runtime();
        engine_debug!("carbon::Scene", "Scene '{}' deactivated", self.name);
    }

    fn dispose_runtime(&mut self) {
        if let Some(mut runtime) = self.runtime.take() {
            runtime.dispose();
        }
    }

    pub fn resize(&mut self, size: UVec2) {
        self.behavior.resize(size);
    }

    // ===== ENTITIES =====

    /// Link `key` and all of its descendants to this scene under `bucket`.
    ///
    /// Either the whole subtree is linked or nothing is.
    pub fn link_entity(&mut self, key: EntityKey, bucket: BucketId) -> Result<()> {
        let mut graph = self.graph.write().map_err(|_| poisoned(&self.name, "entity graph"))?;
        let subtree = graph.subtree(key)?;

        for &member in &subtree {
            let entity = graph.entity(member)?;
            if let Some(link) = entity.link() {
                engine_bail!("carbon::Scene", Error::InvalidOperation(format!(
                    "Scene '{}': entity '{}' is already linked to scene '{}'",
                    self.name, entity.name(), link.scene_name())));
            }
        }

        let weak = Arc::downgrade(&self.buckets);
        for &member in &subtree {
            graph.entity_mut(member)?
                .link_to(EntityLink::new(self.name.clone(), bucket, weak.clone()))?;
            self.entities.push(member);
        }

        engine_debug!("carbon::Scene", "Scene '{}': linked {} entities under bucket {}",
            self.name, subtree.len(), bucket);
        Ok(())
    }

    /// Unlink `key` and the descendants linked to this scene.
    ///
    /// They also leave every render list.
    pub fn unlink_entity(&mut self, key: EntityKey) -> Result<()> {
        let mut graph = self.graph.write().map_err(|_| poisoned(&self.name, "entity graph"))?;
        let root = graph.entity(key)?;
        if !root.link().is_some_and(|l| l.belongs_to(&self.buckets)) {
            engine_bail!("carbon::Scene", Error::InvalidOperation(format!(
                "Scene '{}': entity '{}' is not linked to this scene", self.name, root.name())));
        }

        let subtree = graph.subtree(key)?;
        let mut removed = Vec::new();
        for member in subtree {
            let entity = graph.entity_mut(member)?;
            if entity.link().is_some_and(|l| l.belongs_to(&self.buckets)) {
                entity.unlink()?;
                removed.push(member);
            }
        }

        self.entities.retain(|k| !removed.contains(k));
        for list in self.render_lists.values_mut() {
            list.retain(|k| !removed.contains(k));
        }
        Ok(())
    }

    /// Queue `key` and every descendant for update in `bucket`
    pub fn invalidate_scene_entity(&self, key: EntityKey, bucket: BucketId) -> Result<()> {
        let graph = self.read_graph()?;
        let subtree = graph.subtree(key)?;
        let mut buckets = self.lock_buckets()?;
        for member in subtree {
            buckets.push_update(bucket, member);
        }
        Ok(())
    }

    /// Add `key` and every renderable descendant to `list`.
    ///
    /// Entities that cannot render are walked through but not added.
    pub fn add_to_rendering_list(&mut self, key: EntityKey, list: RenderListId) -> Result<()> {
        let graph = self.graph.read().map_err(|_| poisoned(&self.name, "entity graph"))?;
        let subtree = graph.subtree(key)?;
        let target = self.render_lists.entry(list).or_default();
        for member in subtree {
            let renders = graph.get(member).is_some_and(|e| e.can_render());
            if renders && !target.contains(&member) {
                target.push(member);
            }
        }
        Ok(())
    }

    /// Unlink every entity, then empty entities, buckets, and render lists
    pub fn clear_scene(&mut self) -> Result<()> {
        {
            let mut graph = self.graph.write().map_err(|_| poisoned(&self.name, "entity graph"))?;
            for &key in &self.entities {
                if let Some(entity) = graph.get_mut(key) {
                    if entity.link().is_some_and(|l| l.belongs_to(&self.buckets)) {
                        entity.unlink()?;
                    }
                }
            }
        }
        self.entities.clear();
        self.lock_buckets()?.clear();
        self.render_lists.clear();
        Ok(())
    }

    // ===== FRAME =====

    /// Drain every bucket in ascending id order against the entity graph.
    ///
    /// On error the entries not yet dispatched stay queued.
    fn drain_buckets(&mut self, time: &GameTime) -> Result<usize> {
        let stacks = self.lock_buckets()?.take();
        let mut graph = self.graph.write().map_err(|_| poisoned(&self.name, "entity graph"))?;

        let mut dispatched = 0;
        let mut remaining = stacks.into_iter();
        while let Some((bucket, mut stack)) = remaining.next() {
            match stack.drain_update(graph.entities_mut(), time) {
                Ok(count) => dispatched += count,
                Err(err) => {
                    drop(graph);
                    let mut leftover: BTreeMap<_, _> = remaining.collect();
                    leftover.insert(bucket, stack);
                    self.lock_buckets()?.restore(leftover);
                    return Err(err);
                }
            }
        }
        Ok(dispatched)
    }

    /// Emit this scene's frame through its behavior
    pub fn render(&self, frame_manager: &mut dyn FrameManager) -> Result<()> {
        let graph = self.read_graph()?;
        let ctx = SceneRenderContext {
            scene_name: &self.name,
            graph: &graph,
            render_lists: &self.render_lists,
        };
        self.behavior.render(&ctx, frame_manager)
    }
}

fn poisoned(scene: &str, what: &str) -> Error {
    engine_err!("carbon::Scene",
        Error::BackendError(format!("Scene '{}': {} lock poisoned", scene, what)))
}

impl EngineComponent for Scene {
    fn initialize(&mut self, graphics: &dyn GraphicsProvider) -> Result<()> {
        self.behavior.initialize(graphics)?;
        self.initialized = true;
        engine_info!("carbon::Scene", "Scene '{}' initialized", self.name);
        Ok(())
    }

    /// Run the script `Update` hook once, then drain every bucket
    fn update(&mut self, time: &GameTime) -> Result<bool> {
        if let Some(runtime) = self.runtime.as_mut() {
            runtime.call(SCRIPT_UPDATE_HOOK, time)?;
        }
        self.drain_buckets(time)?;
        Ok(true)
    }

    /// Deactivate if needed, clear the scene, and release behavior state
    fn unload(&mut self) {
        if self.active {
            self.active = false;
            self.deactivate();
        }
        if let Err(err) = self.clear_scene() {
            engine_warn!("carbon::Scene", "Scene '{}': clear failed during unload: {}", self.name, err);
        }
        self.behavior.unload();
        self.initialized = false;
        engine_info!("carbon::Scene", "Scene '{}' unloaded", self.name);
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
