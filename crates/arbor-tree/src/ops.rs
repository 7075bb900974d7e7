//! Operation surface shared by both tree variants.

use crate::validate::InvariantViolation;
use arbor_common::TreeKey;
use arbor_trace::{Metrics, Tracer};

/// The operations both engines expose to collaborators.
///
/// Each variant keeps its own split/merge semantics (the B-Tree moves
/// promoted keys, the B+-Tree copies them at the leaf level); this trait
/// only unifies the call surface so batch drivers and tests stay generic
/// over the variant.
pub trait TreeOps<K: TreeKey> {
    /// Looks up `key`, tracing every visit and comparison.
    fn search(&self, key: &K, tracer: &mut Tracer<K>, metrics: &mut Metrics) -> bool;

    /// Inserts `key`; returns false (no mutation) when it already exists.
    fn insert(&mut self, key: K, tracer: &mut Tracer<K>, metrics: &mut Metrics) -> bool;

    /// Removes `key`; returns false (no mutation) when it is absent.
    fn delete(&mut self, key: &K, tracer: &mut Tracer<K>, metrics: &mut Metrics) -> bool;

    /// Number of keys currently stored.
    fn key_count(&self) -> usize;

    /// All stored keys in ascending order.
    fn keys_in_order(&self) -> Vec<K>;

    /// Certifies structural correctness, reporting the first violation.
    fn validate(&self) -> Result<(), InvariantViolation<K>>;
}

/// Index of the first slot whose key exceeds `key`, which is both the
/// sorted insertion position and the child slot to descend into. Equal
/// keys route right, matching the B+-Tree separator convention.
pub(crate) fn first_greater_slot<K: Ord>(keys: &[K], key: &K) -> usize {
    keys.iter()
        .position(|k| key < k)
        .unwrap_or(keys.len())
}
