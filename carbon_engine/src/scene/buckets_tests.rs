/// Tests for InvalidationBuckets

use super::*;
use slotmap::SlotMap;

fn keys(n: usize) -> Vec<EntityKey> {
    let mut arena: SlotMap<EntityKey, ()> = SlotMap::with_key();
    (0..n).map(|_| arena.insert(())).collect()
}

#[test]
fn test_push_creates_bucket_on_first_use() {
    let k = keys(1);
    let mut buckets = InvalidationBuckets::new();
    assert_eq!(buckets.pending_in(7), 0);

    buckets.push_update(7, k[0]);

    assert_eq!(buckets.pending_in(7), 1);
    assert_eq!(buckets.pending(), 1);
}

#[test]
fn test_counts_per_bucket_and_across() {
    let k = keys(2);
    let mut buckets = InvalidationBuckets::new();
    buckets.push_update(1, k[0]);
    buckets.push_update(5, k[0]);
    buckets.push_update(5, k[1]);

    assert_eq!(buckets.count_in(5, k[0]), 1);
    assert_eq!(buckets.count_in(1, k[1]), 0);
    assert_eq!(buckets.count_of(k[0]), 2);
    assert_eq!(buckets.pending(), 3);
}

#[test]
fn test_take_leaves_buckets_empty_in_ascending_order() {
    let k = keys(1);
    let mut buckets = InvalidationBuckets::new();
    buckets.push_update(9, k[0]);
    buckets.push_update(2, k[0]);

    let taken = buckets.take();

    assert_eq!(taken.keys().copied().collect::<Vec<_>>(), vec![2, 9]);
    assert_eq!(buckets.pending(), 0);
}

#[test]
fn test_restore_merges_leftover() {
    let k = keys(2);
    let mut buckets = InvalidationBuckets::new();
    buckets.push_update(3, k[0]);
    let leftover = buckets.take();

    buckets.push_update(3, k[1]);
    buckets.restore(leftover);

    assert_eq!(buckets.pending_in(3), 2);
    assert_eq!(buckets.count_in(3, k[0]), 1);
    assert_eq!(buckets.count_in(3, k[1]), 1);
}

#[test]
fn test_clear() {
    let k = keys(1);
    let mut buckets = InvalidationBuckets::new();
    buckets.push_update(1, k[0]);
    buckets.clear();
    assert_eq!(buckets.pending(), 0);
}
