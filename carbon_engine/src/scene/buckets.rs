/// Per-scene invalidation buckets.
///
/// One `DeferredDispatchStack` per bucket id, drained in ascending id order.
/// Shared between a scene and its linked entities through
/// `Arc<Mutex<InvalidationBuckets>>`; entities keep only a `Weak`.

use std::collections::BTreeMap;
use crate::logic::DeferredDispatchStack;
use super::scene_entity::{BucketId, EntityKey};

#[derive(Debug, Default)]
pub struct InvalidationBuckets {
    stacks: BTreeMap<BucketId, DeferredDispatchStack<EntityKey>>,
}

impl InvalidationBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `key` for update in `bucket`, creating the bucket on first use
    pub fn push_update(&mut self, bucket: BucketId, key: EntityKey) {
        self.stacks.entry(bucket).or_default().push_update(key);
    }

    /// Total pending entries across every bucket
    pub fn pending(&self) -> usize {
        self.stacks.values().map(|s| s.pending_update()).sum()
    }

    /// Pending entries in one bucket
    pub fn pending_in(&self, bucket: BucketId) -> usize {
        self.stacks.get(&bucket).map_or(0, |s| s.pending_update())
    }

    /// How many times `key` is queued in one bucket
    pub fn count_in(&self, bucket: BucketId, key: EntityKey) -> usize {
        self.stacks.get(&bucket).map_or(0, |s| s.update_count_of(key))
    }

    /// How many times `key` is queued across every bucket
    pub fn count_of(&self, key: EntityKey) -> usize {
        self.stacks.values().map(|s| s.update_count_of(key)).sum()
    }

    /// Detach every stack, leaving the buckets empty.
    ///
    /// The caller drains outside the lock so entity setters can re-queue
    /// themselves during the drain.
    pub fn take(&mut self) -> BTreeMap<BucketId, DeferredDispatchStack<EntityKey>> {
        std::mem::take(&mut self.stacks)
    }

    /// Merge back entries left over by an interrupted drain
    pub fn restore(&mut self, leftover: BTreeMap<BucketId, DeferredDispatchStack<EntityKey>>) {
        for (bucket, mut stack) in leftover {
            if stack.is_empty() {
                continue;
            }
            let target = self.stacks.entry(bucket).or_default();
            stack.append_into(target);
        }
    }

    pub fn clear(&mut self) {
        self.stacks.clear();
    }
}

#[cfg(test)]
#[path = "buckets_tests.rs"]
mod tests;
