/// Deferred dispatch stack.
///
/// Schedules one-shot `initialize` or `update` calls against components
/// living in a `SlotMap` owned by someone else. Entries are generation-checked
/// keys: a component removed from its arena between scheduling and draining
/// is skipped, and scheduling never keeps a component alive.
///
/// Not internally synchronized. One writer pushes, one drainer drains;
/// shared use requires an external lock (`Scene` keeps its stacks behind a
/// `Mutex`).

use slotmap::{Key, SlotMap};
use crate::error::Result;
use crate::engine_trace;
use crate::logic::{EngineComponent, GameTime};
use crate::services::GraphicsProvider;

/// LIFO stacks of pending initialize/update targets
#[derive(Debug, Clone)]
pub struct DeferredDispatchStack<K: Key> {
    initialize_stack: Vec<K>,
    update_stack: Vec<K>,
}

impl<K: Key> DeferredDispatchStack<K> {
    /// Create an empty stack
    pub fn new() -> Self {
        Self {
            initialize_stack: Vec::new(),
            update_stack: Vec::new(),
        }
    }

    /// Schedule `key` for a one-shot `initialize`
    pub fn push_initialize(&mut self, key: K) {
        self.initialize_stack.push(key);
    }

    /// Schedule `key` for a one-shot `update`
    pub fn push_update(&mut self, key: K) {
        self.update_stack.push(key);
    }

    /// Drop every pending entry without dispatching
    pub fn clear(&mut self) {
        self.initialize_stack.clear();
        self.update_stack.clear();
    }

    /// Number of pending initialize entries (live or dead)
    pub fn pending_initialize(&self) -> usize {
        self.initialize_stack.len()
    }

    /// Number of pending update entries (live or dead)
    pub fn pending_update(&self) -> usize {
        self.update_stack.len()
    }

    /// How many times `key` is currently queued for update
    pub fn update_count_of(&self, key: K) -> usize {
        self.update_stack.iter().filter(|k| **k == key).count()
    }

    pub fn is_empty(&self) -> bool {
        self.initialize_stack.is_empty() && self.update_stack.is_empty()
    }

    /// Move every pending entry of `self` under the entries of `target`,
    /// so `target`'s own entries still pop first
    pub fn append_into(&mut self, target: &mut DeferredDispatchStack<K>) {
        let mut initialize = std::mem::take(&mut self.initialize_stack);
        initialize.append(&mut target.initialize_stack);
        target.initialize_stack = initialize;

        let mut update = std::mem::take(&mut self.update_stack);
        update.append(&mut target.update_stack);
        target.update_stack = update;
    }

    /// Pop every initialize entry and initialize the ones still alive.
    ///
    /// Returns the number of components actually initialized. On error the
    /// entries not yet popped stay queued.
    pub fn drain_initialize<T: EngineComponent>(
        &mut self,
        components: &mut SlotMap<K, T>,
        graphics: &dyn GraphicsProvider,
    ) -> Result<usize> {
        let mut dispatched = 0;
        while let Some(key) = self.initialize_stack.pop() {
            match components.get_mut(key) {
                Some(target) => {
                    target.initialize(graphics)?;
                    dispatched += 1;
                }
                None => {
                    engine_trace!("carbon::DeferredDispatchStack",
                        "Skipping initialize of dead target {:?}", key.data());
                }
            }
        }
        Ok(dispatched)
    }

    /// Pop every update entry and update the ones still alive.
    ///
    /// Returns the number of components actually updated. A target's
    /// `Ok(false)` does not stop the drain; an error does, and the entries
    /// not yet popped stay queued.
    pub fn drain_update<T: EngineComponent>(
        &mut self,
        components: &mut SlotMap<K, T>,
        time: &GameTime,
    ) -> Result<usize> {
        let mut dispatched = 0;
        while let Some(key) = self.update_stack.pop() {
            match components.get_mut(key) {
                Some(target) => {
                    target.update(time)?;
                    dispatched += 1;
                }
                None => {
                    engine_trace!("carbon::DeferredDispatchStack",
                        "Skipping update of dead target {:?}", key.data());
                }
            }
        }
        Ok(dispatched)
    }
}

impl<K: Key> Default for DeferredDispatchStack<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "dispatch_stack_tests.rs"]
mod tests;
