//! Timed bulk operation drivers.
//!
//! Batches run with tracing disabled: an animation log of thousands of
//! events is useless, and the point of a batch is the aggregate cost. The
//! access counters are reset at batch start and the whole loop is timed, so
//! a report reflects exactly one batch. Individual operations commit one by
//! one; there is no batch atomicity and a partially applicable batch simply
//! reports a smaller `applied`.

use arbor_common::TreeKey;
use arbor_trace::{Metrics, Tracer};
use arbor_tree::TreeOps;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// Aggregate outcome of one timed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Operations the caller asked for.
    pub requested: usize,
    /// Operations that mutated the tree (duplicates and misses do not).
    pub applied: usize,
    /// Wall-clock time for the whole batch.
    pub elapsed: Duration,
    /// Node reads across the batch.
    pub reads: u64,
    /// Node writes across the batch.
    pub writes: u64,
}

/// Keys picked for a bulk removal, clamped to what the tree holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePlan<K> {
    /// Keys to remove, a uniform sample of the stored keys.
    pub keys: Vec<K>,
    /// Size originally requested.
    pub requested: usize,
    /// Whether the request exceeded the stored key count.
    pub clamped: bool,
}

/// Inserts every key in order, timing the whole loop.
pub fn batch_insert<K, T>(tree: &mut T, keys: Vec<K>, metrics: &mut Metrics) -> BatchReport
where
    K: TreeKey,
    T: TreeOps<K>,
{
    let mut tracer = Tracer::disabled();
    let requested = keys.len();
    metrics.reset_accesses();
    metrics.start_timer();

    let mut applied = 0;
    for key in keys {
        if tree.insert(key, &mut tracer, metrics) {
            applied += 1;
        }
    }

    let elapsed = metrics.stop_timer();
    debug!(requested, applied, ?elapsed, "batch insert finished");
    BatchReport {
        requested,
        applied,
        elapsed,
        reads: metrics.reads(),
        writes: metrics.writes(),
    }
}

/// Removes every key in order, timing the whole loop.
pub fn batch_remove<K, T>(tree: &mut T, keys: &[K], metrics: &mut Metrics) -> BatchReport
where
    K: TreeKey,
    T: TreeOps<K>,
{
    let mut tracer = Tracer::disabled();
    let requested = keys.len();
    metrics.reset_accesses();
    metrics.start_timer();

    let mut applied = 0;
    for key in keys {
        if tree.delete(key, &mut tracer, metrics) {
            applied += 1;
        }
    }

    let elapsed = metrics.stop_timer();
    debug!(requested, applied, ?elapsed, "batch remove finished");
    BatchReport {
        requested,
        applied,
        elapsed,
        reads: metrics.reads(),
        writes: metrics.writes(),
    }
}

/// Samples up to `requested` stored keys for removal, clamping to the
/// number actually present.
pub fn choose_delete_keys<K, T, R>(rng: &mut R, tree: &T, requested: usize) -> DeletePlan<K>
where
    K: TreeKey,
    T: TreeOps<K>,
    R: Rng + ?Sized,
{
    let present = tree.keys_in_order();
    let take = requested.min(present.len());
    let clamped = take < requested;
    if clamped {
        debug!(
            requested,
            available = present.len(),
            "delete request clamped to stored key count"
        );
    }
    let keys = present
        .choose_multiple(rng, take)
        .cloned()
        .collect();
    DeletePlan {
        keys,
        requested,
        clamped,
    }
}
