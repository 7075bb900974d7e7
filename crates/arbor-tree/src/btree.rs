//! Classical B-Tree engine.
//!
//! Keys live in every node. On split the median key is *moved* into the
//! parent and remains in neither half; the split index is `key_count / 2`
//! (truncating division), applied identically on every split so resulting
//! tree shapes are deterministic. Underflow after a delete is resolved
//! bottom-up: redistribution from the left sibling is preferred, then the
//! right sibling, then a merge (left-preferring).

use crate::arena::{Node, NodeArena};
use crate::ops::{first_greater_slot, TreeOps};
use crate::validate::{self, InvariantViolation, SeparatorRule};
use arbor_common::{config, NodeId, Result, TreeKey};
use arbor_trace::{Metrics, TraceEvent, Tracer};
use std::cmp::Ordering;
use tracing::debug;

/// B-Tree with configurable fanout.
pub struct BTree<K: TreeKey> {
    arena: NodeArena<K>,
    root: NodeId,
    fanout: usize,
    max_keys: usize,
    min_keys: usize,
    len: usize,
}

impl<K: TreeKey> BTree<K> {
    /// Creates an empty tree. Fails fast on a fanout outside [3, 10].
    pub fn new(fanout: usize) -> Result<Self> {
        config::validate_fanout(fanout)?;
        let mut arena = NodeArena::new();
        let root = arena.alloc(true);
        Ok(Self {
            arena,
            root,
            fanout,
            max_keys: fanout - 1,
            min_keys: (fanout + 1) / 2 - 1,
            len: 0,
        })
    }

    /// Maximum number of children per internal node.
    pub fn fanout(&self) -> usize {
        self.fanout
    }

    /// Maximum keys any node may hold.
    pub fn max_keys(&self) -> usize {
        self.max_keys
    }

    /// Minimum keys a non-root node must hold.
    pub fn min_keys(&self) -> usize {
        self.min_keys
    }

    /// Identity of the current root.
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Borrows a node for rendering or inspection.
    pub fn node(&self, id: NodeId) -> &Node<K> {
        self.arena.node(id)
    }

    /// True when no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Levels from root to leaves (1 = root is a leaf).
    pub fn height(&self) -> usize {
        let mut levels = 1;
        let mut current = self.root;
        while !self.arena.node(current).is_leaf() {
            current = self.arena.node(current).children()[0];
            levels += 1;
        }
        levels
    }

    /// Number of live nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.arena.live_count()
    }

    /// Looks up `key`, emitting VISIT_NODE, per-slot COMPARE_KEY, and
    /// DESCEND events along the way; terminates with SEARCH_FOUND or
    /// SEARCH_NOT_FOUND.
    pub fn search(&self, key: &K, tracer: &mut Tracer<K>, metrics: &mut Metrics) -> bool {
        let mut current = self.root;
        loop {
            let node = self.arena.node(current);
            tracer.emit(TraceEvent::VisitNode {
                node: current,
                keys: node.keys().to_vec(),
            });
            metrics.record_read();

            let mut child_index = node.keys().len();
            for (slot, node_key) in node.keys().iter().enumerate() {
                tracer.emit(TraceEvent::CompareKey {
                    node: current,
                    slot,
                    node_key: node_key.clone(),
                    target: key.clone(),
                });
                match key.cmp(node_key) {
                    Ordering::Equal => {
                        tracer.emit(TraceEvent::SearchFound {
                            node: current,
                            slot,
                        });
                        return true;
                    }
                    Ordering::Less => {
                        child_index = slot;
                        break;
                    }
                    Ordering::Greater => {}
                }
            }

            if node.is_leaf() {
                tracer.emit(TraceEvent::SearchNotFound { node: current });
                return false;
            }

            tracer.emit(TraceEvent::Descend {
                node: current,
                child_index,
            });
            current = node.children()[child_index];
        }
    }

    /// Inserts `key`. Duplicates are rejected without mutation; the trace
    /// then ends at the SEARCH_FOUND emitted by the duplicate check. On
    /// success the tracer is cleared first, so the log covers only the
    /// mutation descent.
    pub fn insert(&mut self, key: K, tracer: &mut Tracer<K>, metrics: &mut Metrics) -> bool {
        if self.search(&key, tracer, metrics) {
            debug!(key = %key, "btree insert rejected: duplicate");
            return false;
        }
        tracer.clear();

        self.insert_recursive(self.root, key, tracer, metrics);

        // Did the root overflow?
        if self.arena.node(self.root).keys().len() > self.max_keys {
            let old_root = self.root;
            let new_root = self.arena.alloc(false);
            self.arena.node_mut(new_root).children.push(old_root);
            self.root = new_root;
            self.split_child(new_root, 0, tracer, metrics);
            let promoted = self.arena.node(new_root).keys()[0].clone();
            tracer.emit(TraceEvent::NewRoot {
                node: new_root,
                old_root,
                promoted,
            });
        }

        self.len += 1;
        true
    }

    /// Removes `key`. An absent key is a safe no-op reported as not applied;
    /// the trace then ends at SEARCH_NOT_FOUND.
    pub fn delete(&mut self, key: &K, tracer: &mut Tracer<K>, metrics: &mut Metrics) -> bool {
        if !self.search(key, tracer, metrics) {
            debug!(key = %key, "btree delete rejected: not found");
            return false;
        }
        tracer.clear();

        self.delete_recursive(self.root, key.clone(), tracer, metrics);

        // Root emptied with one child left: the tree shrinks a level.
        let root_node = self.arena.node(self.root);
        if root_node.keys().is_empty() && !root_node.is_leaf() {
            let old_root = self.root;
            self.root = root_node.children()[0];
            self.arena.free(old_root);
            tracer.emit(TraceEvent::ShrinkRoot {
                node: self.root,
                old_root,
            });
        }

        self.len -= 1;
        true
    }

    /// Bottom-up recursive insert: descend to the leaf, then check each
    /// child for overflow as the recursion unwinds.
    fn insert_recursive(
        &mut self,
        node_id: NodeId,
        key: K,
        tracer: &mut Tracer<K>,
        metrics: &mut Metrics,
    ) {
        let (is_leaf, keys) = {
            let node = self.arena.node(node_id);
            (node.is_leaf(), node.keys().to_vec())
        };
        tracer.emit(TraceEvent::VisitNode {
            node: node_id,
            keys: keys.clone(),
        });
        metrics.record_read();

        if is_leaf {
            let slot = first_greater_slot(&keys, &key);
            self.arena.node_mut(node_id).keys.insert(slot, key.clone());
            metrics.record_write();
            tracer.emit(TraceEvent::InsertInLeaf {
                node: node_id,
                slot,
                key,
            });
        } else {
            let child_index = first_greater_slot(&keys, &key);
            tracer.emit(TraceEvent::Descend {
                node: node_id,
                child_index,
            });
            let child = self.arena.node(node_id).children()[child_index];
            self.insert_recursive(child, key, tracer, metrics);

            if self.arena.node(child).keys().len() > self.max_keys {
                self.split_child(node_id, child_index, tracer, metrics);
            }
        }
    }

    /// Splits the overflowing child at `child_index`, moving the median key
    /// into `parent`.
    fn split_child(
        &mut self,
        parent: NodeId,
        child_index: usize,
        tracer: &mut Tracer<K>,
        metrics: &mut Metrics,
    ) {
        let child_id = self.arena.node(parent).children()[child_index];
        let (promoted, right_keys, right_children, leaf) = {
            let child = self.arena.node_mut(child_id);
            let mid = child.keys.len() / 2;
            let mut right_keys = child.keys.split_off(mid);
            let promoted = right_keys.remove(0);
            let right_children = if child.is_leaf() {
                Vec::new()
            } else {
                child.children.split_off(mid + 1)
            };
            (promoted, right_keys, right_children, child.is_leaf())
        };

        let right_id = self.arena.alloc(leaf);
        {
            let right = self.arena.node_mut(right_id);
            right.keys = right_keys;
            right.children = right_children;
        }
        {
            let parent_node = self.arena.node_mut(parent);
            parent_node.keys.insert(child_index, promoted.clone());
            parent_node.children.insert(child_index + 1, right_id);
        }
        metrics.record_write();
        tracer.emit(TraceEvent::SplitNode {
            node: child_id,
            right: right_id,
            promoted,
            leaf_split: leaf,
        });
    }

    /// Bottom-up recursive delete with post-recursion underflow checks.
    fn delete_recursive(
        &mut self,
        node_id: NodeId,
        key: K,
        tracer: &mut Tracer<K>,
        metrics: &mut Metrics,
    ) {
        let (is_leaf, keys) = {
            let node = self.arena.node(node_id);
            (node.is_leaf(), node.keys().to_vec())
        };
        tracer.emit(TraceEvent::VisitNode {
            node: node_id,
            keys: keys.clone(),
        });
        metrics.record_read();

        // Locate the key in this node, tracing every comparison made.
        let mut found = None;
        for (slot, node_key) in keys.iter().enumerate() {
            tracer.emit(TraceEvent::CompareKey {
                node: node_id,
                slot,
                node_key: node_key.clone(),
                target: key.clone(),
            });
            match node_key.cmp(&key) {
                Ordering::Equal => {
                    found = Some(slot);
                    break;
                }
                Ordering::Greater => break,
                Ordering::Less => {}
            }
        }

        if let Some(slot) = found {
            tracer.emit(TraceEvent::DeleteFound {
                node: node_id,
                slot,
                key: key.clone(),
            });

            if is_leaf {
                self.arena.node_mut(node_id).keys.remove(slot);
                metrics.record_write();
                tracer.emit(TraceEvent::DeleteInLeaf {
                    node: node_id,
                    slot,
                    key,
                });
            } else {
                // Replace the internal occurrence with its predecessor (the
                // rightmost key of the left subtree), then delete that leaf
                // occurrence instead.
                let predecessor = self.predecessor(node_id, slot);
                self.arena.node_mut(node_id).keys[slot] = predecessor.clone();
                metrics.record_write();

                let child = self.arena.node(node_id).children()[slot];
                self.delete_recursive(child, predecessor, tracer, metrics);

                if self.arena.node(child).keys().len() < self.min_keys {
                    self.resolve_underflow(node_id, slot, tracer, metrics);
                }
            }
        } else {
            if is_leaf {
                // The pre-delete search guarantees presence; nothing to do.
                return;
            }
            let child_index = first_greater_slot(&keys, &key);
            tracer.emit(TraceEvent::Descend {
                node: node_id,
                child_index,
            });
            let child = self.arena.node(node_id).children()[child_index];
            self.delete_recursive(child, key, tracer, metrics);

            if self.arena.node(child).keys().len() < self.min_keys {
                self.resolve_underflow(node_id, child_index, tracer, metrics);
            }
        }
    }

    /// Rightmost key of the subtree rooted at `children[slot]`.
    fn predecessor(&self, node_id: NodeId, slot: usize) -> K {
        let mut current = self.arena.node(node_id).children()[slot];
        while !self.arena.node(current).is_leaf() {
            let node = self.arena.node(current);
            current = node.children()[node.children().len() - 1];
        }
        let keys = self.arena.node(current).keys();
        keys[keys.len() - 1].clone()
    }

    /// Resolves an underflowing child: redistribute from the left sibling,
    /// else the right sibling, else merge (left-preferring).
    fn resolve_underflow(
        &mut self,
        parent: NodeId,
        child_index: usize,
        tracer: &mut Tracer<K>,
        metrics: &mut Metrics,
    ) {
        let child_id = self.arena.node(parent).children()[child_index];
        tracer.emit(TraceEvent::Underflow {
            node: child_id,
            keys: self.arena.node(child_id).keys().len(),
            min_keys: self.min_keys,
        });

        if child_index > 0 {
            let left = self.arena.node(parent).children()[child_index - 1];
            if self.arena.node(left).keys().len() > self.min_keys {
                self.redistribute_from_left(parent, child_index, tracer, metrics);
                return;
            }
        }
        if child_index + 1 < self.arena.node(parent).children().len() {
            let right = self.arena.node(parent).children()[child_index + 1];
            if self.arena.node(right).keys().len() > self.min_keys {
                self.redistribute_from_right(parent, child_index, tracer, metrics);
                return;
            }
        }

        if child_index > 0 {
            self.merge_with_left(parent, child_index, tracer, metrics);
        } else {
            self.merge_with_right(parent, child_index, tracer, metrics);
        }
    }

    /// Rotates one key (and child, for internal nodes) from the left
    /// sibling through the parent separator.
    fn redistribute_from_left(
        &mut self,
        parent: NodeId,
        child_index: usize,
        tracer: &mut Tracer<K>,
        metrics: &mut Metrics,
    ) {
        let left_id = self.arena.node(parent).children()[child_index - 1];
        let child_id = self.arena.node(parent).children()[child_index];
        let separator = self.arena.node(parent).keys()[child_index - 1].clone();

        let (lent_key, lent_child) = {
            let left = self.arena.node_mut(left_id);
            let last = left.keys.len() - 1;
            let lent_key = left.keys.remove(last);
            let lent_child = if left.is_leaf() {
                None
            } else {
                Some(left.children.remove(left.children.len() - 1))
            };
            (lent_key, lent_child)
        };
        {
            let child = self.arena.node_mut(child_id);
            child.keys.insert(0, separator);
            if let Some(lent) = lent_child {
                child.children.insert(0, lent);
            }
        }
        self.arena.node_mut(parent).keys[child_index - 1] = lent_key;
        metrics.record_write();
        tracer.emit(TraceEvent::Redistribute {
            node: left_id,
            to: child_id,
            parent,
            separator_slot: child_index - 1,
        });
    }

    /// Rotates one key (and child, for internal nodes) from the right
    /// sibling through the parent separator.
    fn redistribute_from_right(
        &mut self,
        parent: NodeId,
        child_index: usize,
        tracer: &mut Tracer<K>,
        metrics: &mut Metrics,
    ) {
        let child_id = self.arena.node(parent).children()[child_index];
        let right_id = self.arena.node(parent).children()[child_index + 1];
        let separator = self.arena.node(parent).keys()[child_index].clone();

        let (lent_key, lent_child) = {
            let right = self.arena.node_mut(right_id);
            let lent_key = right.keys.remove(0);
            let lent_child = if right.is_leaf() {
                None
            } else {
                Some(right.children.remove(0))
            };
            (lent_key, lent_child)
        };
        {
            let child = self.arena.node_mut(child_id);
            child.keys.push(separator);
            if let Some(lent) = lent_child {
                child.children.push(lent);
            }
        }
        self.arena.node_mut(parent).keys[child_index] = lent_key;
        metrics.record_write();
        tracer.emit(TraceEvent::Redistribute {
            node: right_id,
            to: child_id,
            parent,
            separator_slot: child_index,
        });
    }

    /// Merges the child at `child_index` into its left sibling, pulling the
    /// separator down. The absorbed node is freed.
    fn merge_with_left(
        &mut self,
        parent: NodeId,
        child_index: usize,
        tracer: &mut Tracer<K>,
        metrics: &mut Metrics,
    ) {
        let left_id = self.arena.node(parent).children()[child_index - 1];
        let child_id = self.arena.node(parent).children()[child_index];

        let separator = self.arena.node_mut(parent).keys.remove(child_index - 1);
        let (child_keys, child_children) = {
            let child = self.arena.node_mut(child_id);
            (std::mem::take(&mut child.keys), std::mem::take(&mut child.children))
        };
        {
            let left = self.arena.node_mut(left_id);
            left.keys.push(separator.clone());
            left.keys.extend(child_keys);
            left.children.extend(child_children);
        }
        self.arena.node_mut(parent).children.remove(child_index);
        self.arena.free(child_id);
        metrics.record_write();
        tracer.emit(TraceEvent::Merge {
            node: left_id,
            absorbed: child_id,
            parent,
            separator,
        });
    }

    /// Merges the right sibling into the child at `child_index`, pulling
    /// the separator down. The absorbed node is freed.
    fn merge_with_right(
        &mut self,
        parent: NodeId,
        child_index: usize,
        tracer: &mut Tracer<K>,
        metrics: &mut Metrics,
    ) {
        let child_id = self.arena.node(parent).children()[child_index];
        let right_id = self.arena.node(parent).children()[child_index + 1];

        let separator = self.arena.node_mut(parent).keys.remove(child_index);
        let (right_keys, right_children) = {
            let right = self.arena.node_mut(right_id);
            (std::mem::take(&mut right.keys), std::mem::take(&mut right.children))
        };
        {
            let child = self.arena.node_mut(child_id);
            child.keys.push(separator.clone());
            child.keys.extend(right_keys);
            child.children.extend(right_children);
        }
        self.arena.node_mut(parent).children.remove(child_index + 1);
        self.arena.free(right_id);
        metrics.record_write();
        tracer.emit(TraceEvent::Merge {
            node: child_id,
            absorbed: right_id,
            parent,
            separator,
        });
    }

    fn collect_in_order(&self, node_id: NodeId, out: &mut Vec<K>) {
        let node = self.arena.node(node_id);
        if node.is_leaf() {
            out.extend(node.keys().iter().cloned());
            return;
        }
        for (i, child) in node.children().iter().enumerate() {
            self.collect_in_order(*child, out);
            if i < node.keys().len() {
                out.push(node.keys()[i].clone());
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn arena_mut(&mut self) -> &mut NodeArena<K> {
        &mut self.arena
    }
}

impl<K: TreeKey> TreeOps<K> for BTree<K> {
    fn search(&self, key: &K, tracer: &mut Tracer<K>, metrics: &mut Metrics) -> bool {
        BTree::search(self, key, tracer, metrics)
    }

    fn insert(&mut self, key: K, tracer: &mut Tracer<K>, metrics: &mut Metrics) -> bool {
        BTree::insert(self, key, tracer, metrics)
    }

    fn delete(&mut self, key: &K, tracer: &mut Tracer<K>, metrics: &mut Metrics) -> bool {
        BTree::delete(self, key, tracer, metrics)
    }

    fn key_count(&self) -> usize {
        self.len
    }

    fn keys_in_order(&self) -> Vec<K> {
        let mut out = Vec::with_capacity(self.len);
        self.collect_in_order(self.root, &mut out);
        out
    }

    fn validate(&self) -> std::result::Result<(), InvariantViolation<K>> {
        validate::validate_tree(
            &self.arena,
            self.root,
            self.max_keys,
            self.min_keys,
            SeparatorRule::MovedUp,
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_trace::EventKind;

    fn fresh() -> (Tracer<i64>, Metrics) {
        (Tracer::new(), Metrics::new())
    }

    fn insert_all(tree: &mut BTree<i64>, keys: &[i64]) {
        for &k in keys {
            let (mut tracer, mut metrics) = fresh();
            assert!(tree.insert(k, &mut tracer, &mut metrics), "insert {k}");
            tree.validate().unwrap();
        }
    }

    #[test]
    fn test_invalid_fanout_rejected() {
        assert!(BTree::<i64>::new(2).is_err());
        assert!(BTree::<i64>::new(11).is_err());
        assert!(BTree::<i64>::new(3).is_ok());
    }

    #[test]
    fn test_insert_into_empty_trace() {
        let mut tree = BTree::new(3).unwrap();
        let (mut tracer, mut metrics) = fresh();
        assert!(tree.insert(42, &mut tracer, &mut metrics));

        let kinds: Vec<EventKind> = tracer.events().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![EventKind::VisitNode, EventKind::InsertInLeaf]);
        assert_eq!(metrics.writes(), 1);
    }

    #[test]
    fn test_duplicate_insert_trace_ends_at_search_found() {
        let mut tree = BTree::new(3).unwrap();
        insert_all(&mut tree, &[42]);

        let (mut tracer, mut metrics) = fresh();
        assert!(!tree.insert(42, &mut tracer, &mut metrics));
        assert_eq!(
            tracer.events().last().map(|e| e.kind()),
            Some(EventKind::SearchFound)
        );
        assert_eq!(tree.key_count(), 1);
    }

    #[test]
    fn test_split_shape_fanout_three() {
        // 10, 20, 30 overflow the single leaf; 40 lands in the right leaf.
        let mut tree = BTree::new(3).unwrap();
        insert_all(&mut tree, &[10, 20, 30, 40]);

        let root = tree.node(tree.root_id());
        assert_eq!(root.keys(), &[20]);
        assert_eq!(root.children().len(), 2);
        assert_eq!(tree.node(root.children()[0]).keys(), &[10]);
        assert_eq!(tree.node(root.children()[1]).keys(), &[30, 40]);
        assert_eq!(tree.height(), 2);
    }

    #[test]
    fn test_split_emits_new_root() {
        let mut tree = BTree::new(3).unwrap();
        insert_all(&mut tree, &[10, 20]);

        let (mut tracer, mut metrics) = fresh();
        assert!(tree.insert(30, &mut tracer, &mut metrics));
        let kinds: Vec<EventKind> = tracer.events().iter().map(|e| e.kind()).collect();
        assert!(kinds.contains(&EventKind::SplitNode));
        assert_eq!(kinds.last(), Some(&EventKind::NewRoot));
    }

    #[test]
    fn test_search_found_and_not_found() {
        let mut tree = BTree::new(4).unwrap();
        insert_all(&mut tree, &[5, 1, 9, 3, 7]);

        for k in [1, 3, 5, 7, 9] {
            let (mut tracer, mut metrics) = fresh();
            assert!(tree.search(&k, &mut tracer, &mut metrics), "search {k}");
        }
        let (mut tracer, mut metrics) = fresh();
        assert!(!tree.search(&4, &mut tracer, &mut metrics));
        assert_eq!(
            tracer.events().last().map(|e| e.kind()),
            Some(EventKind::SearchNotFound)
        );
    }

    #[test]
    fn test_metrics_reads_match_visits() {
        let mut tree = BTree::new(3).unwrap();
        insert_all(&mut tree, &[1, 2, 3, 4, 5]);

        let (mut tracer, mut metrics) = fresh();
        tree.search(&5, &mut tracer, &mut metrics);
        let visits = tracer
            .events()
            .iter()
            .filter(|e| e.kind() == EventKind::VisitNode)
            .count() as u64;
        assert_eq!(metrics.node_accesses(), visits);
    }

    #[test]
    fn test_delete_from_leaf() {
        let mut tree = BTree::new(4).unwrap();
        insert_all(&mut tree, &[1, 2, 3]);

        let (mut tracer, mut metrics) = fresh();
        assert!(tree.delete(&2, &mut tracer, &mut metrics));
        let kinds: Vec<EventKind> = tracer.events().iter().map(|e| e.kind()).collect();
        assert!(kinds.contains(&EventKind::DeleteFound));
        assert!(kinds.contains(&EventKind::DeleteInLeaf));
        assert_eq!(tree.keys_in_order(), vec![1, 3]);
        tree.validate().unwrap();
    }

    #[test]
    fn test_delete_internal_uses_predecessor() {
        // Root [20] with leaves [10] and [30, 40]; deleting 20 must pull
        // the predecessor 10 up.
        let mut tree = BTree::new(3).unwrap();
        insert_all(&mut tree, &[10, 20, 30, 40]);

        let (mut tracer, mut metrics) = fresh();
        assert!(tree.delete(&20, &mut tracer, &mut metrics));
        tree.validate().unwrap();
        assert_eq!(tree.keys_in_order(), vec![10, 30, 40]);
    }

    #[test]
    fn test_merge_shrinks_root() {
        let mut tree = BTree::new(3).unwrap();
        insert_all(&mut tree, &[10, 20, 30, 40, 50]);
        assert_eq!(tree.height(), 2);

        let mut kinds_seen = Vec::new();
        for k in [10, 50, 40] {
            let (mut tracer, mut metrics) = fresh();
            assert!(tree.delete(&k, &mut tracer, &mut metrics), "delete {k}");
            tree.validate().unwrap();
            kinds_seen.extend(tracer.events().iter().map(|e| e.kind()));
        }
        assert!(kinds_seen.contains(&EventKind::Underflow));
        assert!(kinds_seen.contains(&EventKind::Merge));
        assert!(kinds_seen.contains(&EventKind::ShrinkRoot));
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.keys_in_order(), vec![20, 30]);
    }

    #[test]
    fn test_redistribute_before_merge() {
        // Right leaf [30, 40] can lend through the parent when [10] empties.
        let mut tree = BTree::new(3).unwrap();
        insert_all(&mut tree, &[10, 20, 30, 40]);

        let (mut tracer, mut metrics) = fresh();
        assert!(tree.delete(&10, &mut tracer, &mut metrics));
        let kinds: Vec<EventKind> = tracer.events().iter().map(|e| e.kind()).collect();
        assert!(kinds.contains(&EventKind::Redistribute));
        assert!(!kinds.contains(&EventKind::Merge));
        tree.validate().unwrap();
    }

    #[test]
    fn test_idempotent_delete_of_absent_key() {
        let mut tree = BTree::new(3).unwrap();
        insert_all(&mut tree, &[1, 2]);

        for _ in 0..2 {
            let (mut tracer, mut metrics) = fresh();
            assert!(!tree.delete(&99, &mut tracer, &mut metrics));
            assert_eq!(tree.keys_in_order(), vec![1, 2]);
            tree.validate().unwrap();
        }
    }

    #[test]
    fn test_delete_on_empty_tree_is_not_found() {
        let mut tree = BTree::new(5).unwrap();
        let (mut tracer, mut metrics) = fresh();
        assert!(!tree.delete(&1, &mut tracer, &mut metrics));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_merge_frees_absorbed_nodes() {
        let mut tree = BTree::new(3).unwrap();
        insert_all(&mut tree, &[10, 20, 30, 40, 50]);
        let before = tree.node_count();

        for k in [10, 50, 40] {
            let (mut tracer, mut metrics) = fresh();
            tree.delete(&k, &mut tracer, &mut metrics);
        }
        assert!(tree.node_count() < before);
    }

    #[test]
    fn test_validate_flags_corrupted_order() {
        let mut tree = BTree::new(3).unwrap();
        insert_all(&mut tree, &[1, 2, 3, 4]);
        let second = tree.node(tree.root_id()).children()[1];
        tree.arena_mut().node_mut(second).keys.reverse();
        assert!(tree.validate().is_err());
    }

    #[test]
    fn test_string_keys() {
        let mut tree: BTree<String> = BTree::new(3).unwrap();
        for word in ["pear", "apple", "fig", "date", "cherry"] {
            let (mut tracer, mut metrics) = (Tracer::new(), Metrics::new());
            assert!(tree.insert(word.to_string(), &mut tracer, &mut metrics));
            tree.validate().unwrap();
        }
        assert_eq!(
            tree.keys_in_order(),
            vec!["apple", "cherry", "date", "fig", "pear"]
        );
    }
}
