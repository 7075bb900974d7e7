//! Lazy range scan over the B+-Tree leaf chain.

use crate::arena::NodeArena;
use arbor_common::{NodeId, TreeKey};
use arbor_trace::{Metrics, TraceEvent, Tracer};

/// Iterator over the keys in `[low, high]`, produced by
/// [`BPlusTree::range`](crate::BPlusTree::range).
///
/// The producing tree has already descended to the leaf holding the first
/// in-range key; the scan walks the chain from there, emitting one
/// VISIT_NODE per leaf it enters and stopping at the first key above the
/// upper bound. Keys are yielded lazily, so an abandoned scan costs only
/// the leaves actually visited.
pub struct RangeScan<'a, K: TreeKey> {
    arena: &'a NodeArena<K>,
    current: Option<NodeId>,
    slot: usize,
    high: K,
    entering: bool,
    tracer: &'a mut Tracer<K>,
    metrics: &'a mut Metrics,
}

impl<'a, K: TreeKey> RangeScan<'a, K> {
    pub(crate) fn new(
        arena: &'a NodeArena<K>,
        start_leaf: NodeId,
        start_slot: usize,
        high: K,
        tracer: &'a mut Tracer<K>,
        metrics: &'a mut Metrics,
    ) -> Self {
        Self {
            arena,
            current: Some(start_leaf),
            slot: start_slot,
            high,
            entering: true,
            tracer,
            metrics,
        }
    }
}

impl<K: TreeKey> Iterator for RangeScan<'_, K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        loop {
            let leaf_id = self.current?;
            let leaf = self.arena.node(leaf_id);

            if self.entering {
                self.tracer.emit(TraceEvent::VisitNode {
                    node: leaf_id,
                    keys: leaf.keys().to_vec(),
                });
                self.metrics.record_read();
                self.entering = false;
            }

            if self.slot >= leaf.keys().len() {
                self.current = leaf.next_leaf();
                self.slot = 0;
                self.entering = true;
                continue;
            }

            let key = &leaf.keys()[self.slot];
            if *key > self.high {
                self.current = None;
                return None;
            }
            self.slot += 1;
            return Some(key.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::bplustree::BPlusTree;
    use arbor_trace::{EventKind, Metrics, Tracer};

    #[test]
    fn test_scan_is_lazy() {
        let mut tree = BPlusTree::new(3).unwrap();
        for k in 1..=30 {
            let (mut tracer, mut metrics) = (Tracer::new(), Metrics::new());
            assert!(tree.insert(k, &mut tracer, &mut metrics));
        }

        // Taking only two keys must not walk the whole chain.
        let (mut tracer, mut metrics) = (Tracer::new(), Metrics::new());
        let low = 1;
        let taken: Vec<i64> = tree
            .range(&low, 30, &mut tracer, &mut metrics)
            .take(2)
            .collect();
        assert_eq!(taken, vec![1, 2]);
        let visits = tracer
            .events()
            .iter()
            .filter(|e| e.kind() == EventKind::VisitNode)
            .count();
        assert_eq!(visits, 1);
    }

    #[test]
    fn test_scan_visits_each_leaf_once() {
        let mut tree = BPlusTree::new(4).unwrap();
        for k in 1..=50 {
            let (mut tracer, mut metrics) = (Tracer::new(), Metrics::new());
            assert!(tree.insert(k, &mut tracer, &mut metrics));
        }

        let (mut tracer, mut metrics) = (Tracer::new(), Metrics::new());
        let low = 10;
        let keys: Vec<i64> = tree.range(&low, 20, &mut tracer, &mut metrics).collect();
        assert_eq!(keys.len(), 11);

        let visited: Vec<_> = tracer
            .events()
            .iter()
            .filter(|e| e.kind() == EventKind::VisitNode)
            .map(|e| e.node())
            .collect();
        let mut deduped = visited.clone();
        deduped.dedup();
        assert_eq!(visited, deduped, "no leaf entered twice");
    }

    #[test]
    fn test_scan_stops_past_last_key() {
        let mut tree = BPlusTree::new(3).unwrap();
        for k in [10i64, 20, 30] {
            let (mut tracer, mut metrics) = (Tracer::new(), Metrics::new());
            assert!(tree.insert(k, &mut tracer, &mut metrics));
        }
        let (mut tracer, mut metrics) = (Tracer::new(), Metrics::new());
        let low = 25;
        let keys: Vec<i64> = tree.range(&low, 99, &mut tracer, &mut metrics).collect();
        assert_eq!(keys, vec![30]);
    }
}
