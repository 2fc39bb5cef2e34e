/// Mock collaborators for testing without a device, content pipeline, or VM.
///
/// Every mock records what the core asked of it so tests can assert on
/// call order and counts. Recording state is shared through `Arc` so a
/// test can keep a handle after moving the mock into a scene or manager.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use glam::UVec2;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::logic::GameTime;
use crate::scene::{render_all_lists, SceneBehavior, SceneRenderContext};
use super::{
    ContentHash, ContentProvider, FrameInstructionSet, FrameManager, GraphicsProvider,
    ScriptHost, ScriptResource, ScriptRuntime,
};

// ===== GRAPHICS =====

/// Graphics provider recording resize, cache-clear, and reset calls
pub struct MockGraphics {
    viewport: Mutex<UVec2>,
    resizes: Mutex<Vec<UVec2>>,
    clear_cache_count: AtomicUsize,
    reset_count: AtomicUsize,
}

impl MockGraphics {
    pub fn new(viewport: UVec2) -> Self {
        Self {
            viewport: Mutex::new(viewport),
            resizes: Mutex::new(Vec::new()),
            clear_cache_count: AtomicUsize::new(0),
            reset_count: AtomicUsize::new(0),
        }
    }

    /// Convenience: a shared 800x600 mock
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new(UVec2::new(800, 600)))
    }

    pub fn resizes(&self) -> Vec<UVec2> {
        self.resizes.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn clear_cache_count(&self) -> usize {
        self.clear_cache_count.load(Ordering::SeqCst)
    }

    pub fn reset_count(&self) -> usize {
        self.reset_count.load(Ordering::SeqCst)
    }
}

impl GraphicsProvider for MockGraphics {
    fn viewport_size(&self) -> UVec2 {
        self.viewport.lock().map(|v| *v).unwrap_or(UVec2::ZERO)
    }

    fn resize(&self, size: UVec2) {
        if let Ok(mut viewport) = self.viewport.lock() {
            *viewport = size;
        }
        if let Ok(mut resizes) = self.resizes.lock() {
            resizes.push(size);
        }
    }

    fn clear_cache(&self) {
        self.clear_cache_count.fetch_add(1, Ordering::SeqCst);
    }

    fn reset(&self) -> Result<()> {
        self.reset_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ===== CONTENT =====

/// In-memory content map
#[derive(Default)]
pub struct MockContentProvider {
    entries: FxHashMap<ContentHash, Arc<dyn Any + Send + Sync>>,
}

impl MockContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a typed payload under `hash`
    pub fn insert<T: Any + Send + Sync>(&mut self, hash: impl Into<ContentHash>, payload: T) {
        self.entries.insert(hash.into(), Arc::new(payload));
    }

    /// Builder-style shortcut for a script resource
    pub fn with_script(mut self, hash: &str, source: &str) -> Self {
        let hash = ContentHash::new(hash);
        self.entries.insert(hash.clone(), Arc::new(ScriptResource {
            hash,
            source: source.to_string(),
        }));
        self
    }
}

impl ContentProvider for MockContentProvider {
    fn load_raw(&self, hash: &ContentHash) -> Option<Arc<dyn Any + Send + Sync>> {
        self.entries.get(hash).cloned()
    }
}

// ===== SCRIPTING =====

/// Counters shared by a `MockScriptHost` and the runtimes it creates
#[derive(Debug, Default)]
pub struct ScriptStats {
    pub created: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
    pub disposed: AtomicUsize,
}

impl ScriptStats {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

/// Script host handing out counting runtimes, or nothing when `refuse` is set
pub struct MockScriptHost {
    pub stats: Arc<ScriptStats>,
    refuse: bool,
    fail_calls: bool,
}

impl MockScriptHost {
    pub fn new() -> Self {
        Self { stats: Arc::new(ScriptStats::default()), refuse: false, fail_calls: false }
    }

    /// Host that never produces a runtime
    pub fn refusing() -> Self {
        Self { refuse: true, ..Self::new() }
    }

    /// Host whose runtimes fail every call
    pub fn failing_calls() -> Self {
        Self { fail_calls: true, ..Self::new() }
    }
}

impl Default for MockScriptHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptHost for MockScriptHost {
    fn create_runtime(&self, script: &ScriptResource) -> Option<Box<dyn ScriptRuntime>> {
        if self.refuse {
            return None;
        }
        self.stats.created.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(MockScriptRuntime {
            script: script.hash.clone(),
            stats: self.stats.clone(),
            fail_calls: self.fail_calls,
        }))
    }
}

/// Runtime recording every named call
pub struct MockScriptRuntime {
    script: ContentHash,
    stats: Arc<ScriptStats>,
    fail_calls: bool,
}

impl ScriptRuntime for MockScriptRuntime {
    fn call(&mut self, name: &str, _time: &GameTime) -> Result<()> {
        if self.fail_calls {
            return Err(Error::BackendError(format!("script {} failed in {}", self.script, name)));
        }
        if let Ok(mut calls) = self.stats.calls.lock() {
            calls.push(name.to_string());
        }
        Ok(())
    }

    fn dispose(&mut self) {
        self.stats.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

// ===== FRAME =====

/// Frame manager keeping every committed instruction set
#[derive(Debug, Default)]
pub struct RecordingFrameManager {
    pub begun: usize,
    pub committed: Vec<FrameInstructionSet>,
}

impl RecordingFrameManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total instructions across every committed set
    pub fn instruction_count(&self) -> usize {
        self.committed.iter().map(|s| s.len()).sum()
    }
}

impl FrameManager for RecordingFrameManager {
    fn begin_set(&mut self) -> FrameInstructionSet {
        self.begun += 1;
        FrameInstructionSet::new()
    }

    fn render_set(&mut self, set: FrameInstructionSet) {
        self.committed.push(set);
    }
}

// ===== SCENE BEHAVIOR =====

/// Ordered log of lifecycle events, shareable between several scenes
pub type SceneJournal = Arc<Mutex<Vec<String>>>;

/// Scene behavior writing `"<tag>:<event>"` lines into a journal
pub struct RecordingSceneBehavior {
    tag: String,
    journal: SceneJournal,
    /// Calls allowed to succeed before `initialize`/`activate` start failing
    initialize_budget: Option<usize>,
    activate_budget: Option<usize>,
}

impl RecordingSceneBehavior {
    pub fn new(tag: impl Into<String>, journal: SceneJournal) -> Self {
        Self { tag: tag.into(), journal, initialize_budget: None, activate_budget: None }
    }

    /// Behavior whose `initialize` always fails
    pub fn failing_initialize(tag: impl Into<String>, journal: SceneJournal) -> Self {
        Self::failing_initialize_after(tag, journal, 0)
    }

    /// Behavior whose `initialize` succeeds `successes` times, then fails
    pub fn failing_initialize_after(tag: impl Into<String>, journal: SceneJournal, successes: usize) -> Self {
        Self { initialize_budget: Some(successes), ..Self::new(tag, journal) }
    }

    /// Behavior whose `activate` succeeds `successes` times, then fails
    pub fn failing_activate_after(tag: impl Into<String>, journal: SceneJournal, successes: usize) -> Self {
        Self { activate_budget: Some(successes), ..Self::new(tag, journal) }
    }

    /// Fresh empty journal
    pub fn journal() -> SceneJournal {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn record(&self, event: &str) {
        if let Ok(mut journal) = self.journal.lock() {
            journal.push(format!("{}:{}", self.tag, event));
        }
    }
}

impl SceneBehavior for RecordingSceneBehavior {
    fn initialize(&mut self, _graphics: &dyn GraphicsProvider) -> Result<()> {
        self.record("initialize");
        match self.initialize_budget.as_mut() {
            Some(0) => Err(Error::InitializationFailed(format!("{} refused to initialize", self.tag))),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn resize(&mut self, size: UVec2) {
        self.record(&format!("resize {}x{}", size.x, size.y));
    }

    fn activate(&mut self) -> Result<()> {
        self.record("activate");
        match self.activate_budget.as_mut() {
            Some(0) => Err(Error::BackendError(format!("{} refused to activate", self.tag))),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn deactivate(&mut self) {
        self.record("deactivate");
    }

    fn unload(&mut self) {
        self.record("unload");
    }

    fn render(&self, ctx: &SceneRenderContext<'_>, frame_manager: &mut dyn FrameManager) -> Result<()> {
        self.record("render");
        render_all_lists(ctx, frame_manager);
        Ok(())
    }
}
