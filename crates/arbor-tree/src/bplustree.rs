//! B+-Tree engine.
//!
//! Keys live only in the leaves; internal nodes hold routing separators that
//! are *copies* of leaf keys. A leaf split copies the median up and keeps it
//! as the first key of the right leaf; internal splits move separators as
//! the B-Tree does. Leaves form a singly linked chain in key order, which
//! range and sequential scans walk without re-descending.
//!
//! Restructuring is bottom-up and reactive, exactly as in the B-Tree
//! engine: a node is split once it exceeds the key limit and repaired once
//! it drops below the minimum. Splitting full-but-legal nodes ahead of the
//! descent does not survive even key limits (fanout 3 leaves nothing for
//! the right half of a two-key internal node), so no preemptive variant is
//! offered.

use crate::arena::{Node, NodeArena};
use crate::ops::{first_greater_slot, TreeOps};
use crate::scan::RangeScan;
use crate::validate::{self, InvariantViolation, SeparatorRule};
use arbor_common::{config, NodeId, Result, TreeKey};
use arbor_trace::{Metrics, TraceEvent, Tracer};
use std::cmp::Ordering;
use tracing::debug;

/// B+-Tree with configurable fanout.
pub struct BPlusTree<K: TreeKey> {
    arena: NodeArena<K>,
    root: NodeId,
    fanout: usize,
    max_keys: usize,
    min_keys: usize,
    len: usize,
}

impl<K: TreeKey> BPlusTree<K> {
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

    /// Leftmost leaf, head of the leaf chain.
    pub fn first_leaf(&self) -> NodeId {
        let mut current = self.root;
        while !self.arena.node(current).is_leaf() {
            current = self.arena.node(current).children()[0];
        }
        current
    }

    /// Looks up `key`. Separators only route; a match is reported only at
    /// the leaf level, with keys equal to a separator living in the right
    /// subtree.
    pub fn search(&self, key: &K, tracer: &mut Tracer<K>, metrics: &mut Metrics) -> bool {
        let mut current = self.root;
        loop {
            let node = self.arena.node(current);
            tracer.emit(TraceEvent::VisitNode {
                node: current,
                keys: node.keys().to_vec(),
            });
            metrics.record_read();

            if node.is_leaf() {
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
                        Ordering::Less => break,
                        Ordering::Greater => {}
                    }
                }
                tracer.emit(TraceEvent::SearchNotFound { node: current });
                return false;
            }

            let child_index = self.route(current, key, tracer);
            tracer.emit(TraceEvent::Descend {
                node: current,
                child_index,
            });
            current = node.children()[child_index];
        }
    }

    /// Inserts `key`. Duplicates are rejected without mutation; on success
    /// the tracer is cleared after the duplicate check so the log covers
    /// only the mutation descent.
    pub fn insert(&mut self, key: K, tracer: &mut Tracer<K>, metrics: &mut Metrics) -> bool {
        if self.search(&key, tracer, metrics) {
            debug!(key = %key, "bplustree insert rejected: duplicate");
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

    /// Removes `key`. The existence check runs with tracing suppressed, so
    /// the recorded trace covers only the mutation descent.
    pub fn delete(&mut self, key: &K, tracer: &mut Tracer<K>, metrics: &mut Metrics) -> bool {
        let was_enabled = tracer.is_enabled();
        tracer.disable();
        let found = self.search(key, tracer, metrics);
        if was_enabled {
            tracer.enable();
        }
        if !found {
            debug!(key = %key, "bplustree delete rejected: not found");
            return false;
        }
        tracer.clear();

        self.delete_recursive(self.root, key.clone(), tracer, metrics);

        // Root emptied by a merge of its last two children: shrink a level.
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

    /// Keys in `[low, high]`, as a lazy scan over the leaf chain.
    ///
    /// The descent to the starting leaf is silent; the scan itself emits one
    /// VISIT_NODE per leaf it enters.
    pub fn range<'a>(
        &'a self,
        low: &K,
        high: K,
        tracer: &'a mut Tracer<K>,
        metrics: &'a mut Metrics,
    ) -> RangeScan<'a, K> {
        let mut current = self.root;
        while !self.arena.node(current).is_leaf() {
            let node = self.arena.node(current);
            let child_index = first_greater_slot(node.keys(), low);
            current = node.children()[child_index];
        }
        let slot = self
            .arena
            .node(current)
            .keys()
            .iter()
            .position(|k| k >= low)
            .unwrap_or_else(|| self.arena.node(current).keys().len());
        RangeScan::new(&self.arena, current, slot, high, tracer, metrics)
    }

    /// Every stored key in ascending order, walking the leaf chain.
    pub fn sequential_scan(&self, tracer: &mut Tracer<K>, metrics: &mut Metrics) -> Vec<K> {
        let mut out = Vec::with_capacity(self.len);
        let mut current = Some(self.first_leaf());
        while let Some(leaf_id) = current {
            let leaf = self.arena.node(leaf_id);
            tracer.emit(TraceEvent::VisitNode {
                node: leaf_id,
                keys: leaf.keys().to_vec(),
            });
            metrics.record_read();
            out.extend(leaf.keys().iter().cloned());
            current = leaf.next_leaf();
        }
        out
    }

    /// Routing scan over an internal node's separators, tracing each
    /// comparison. Keys equal to a separator route right.
    fn route(&self, node_id: NodeId, key: &K, tracer: &mut Tracer<K>) -> usize {
        let node = self.arena.node(node_id);
        let mut child_index = node.keys().len();
        for (slot, node_key) in node.keys().iter().enumerate() {
            tracer.emit(TraceEvent::CompareKey {
                node: node_id,
                slot,
                node_key: node_key.clone(),
                target: key.clone(),
            });
            if key < node_key {
                child_index = slot;
                break;
            }
        }
        child_index
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
            return;
        }

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

    /// Splits the overflowing child at `child_index`. Leaf splits copy the
    /// median up and relink the chain; internal splits move the median up.
    fn split_child(
        &mut self,
        parent: NodeId,
        child_index: usize,
        tracer: &mut Tracer<K>,
        metrics: &mut Metrics,
    ) {
        let child_id = self.arena.node(parent).children()[child_index];
        let leaf = self.arena.node(child_id).is_leaf();

        let (promoted, right_keys, right_children, chain_next) = {
            let child = self.arena.node_mut(child_id);
            let mid = child.keys.len() / 2;
            if leaf {
                let right_keys = child.keys.split_off(mid);
                let promoted = right_keys[0].clone();
                (promoted, right_keys, Vec::new(), child.next_leaf)
            } else {
                let mut right_keys = child.keys.split_off(mid);
                let promoted = right_keys.remove(0);
                let right_children = child.children.split_off(mid + 1);
                (promoted, right_keys, right_children, None)
            }
        };

        let right_id = self.arena.alloc(leaf);
        {
            let right = self.arena.node_mut(right_id);
            right.keys = right_keys;
            right.children = right_children;
            right.next_leaf = chain_next;
        }
        if leaf {
            self.arena.node_mut(child_id).next_leaf = Some(right_id);
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

        if is_leaf {
            for (slot, node_key) in keys.iter().enumerate() {
                tracer.emit(TraceEvent::CompareKey {
                    node: node_id,
                    slot,
                    node_key: node_key.clone(),
                    target: key.clone(),
                });
                match node_key.cmp(&key) {
                    Ordering::Equal => {
                        tracer.emit(TraceEvent::DeleteFound {
                            node: node_id,
                            slot,
                            key: key.clone(),
                        });
                        self.arena.node_mut(node_id).keys.remove(slot);
                        metrics.record_write();
                        tracer.emit(TraceEvent::DeleteInLeaf {
                            node: node_id,
                            slot,
                            key,
                        });
                        return;
                    }
                    Ordering::Greater => return,
                    Ordering::Less => {}
                }
            }
            return;
        }

        let child_index = self.route(node_id, &key, tracer);
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

    /// Borrows one key from the left sibling. At the leaf level the moved
    /// key becomes the new parent separator; at the internal level the
    /// separator rotates down and the sibling's last key rotates up.
    fn redistribute_from_left(
        &mut self,
        parent: NodeId,
        child_index: usize,
        tracer: &mut Tracer<K>,
        metrics: &mut Metrics,
    ) {
        let left_id = self.arena.node(parent).children()[child_index - 1];
        let child_id = self.arena.node(parent).children()[child_index];
        let leaf = self.arena.node(child_id).is_leaf();

        if leaf {
            let moved = {
                let left = self.arena.node_mut(left_id);
                let last = left.keys.len() - 1;
                left.keys.remove(last)
            };
            self.arena.node_mut(child_id).keys.insert(0, moved.clone());
            self.arena.node_mut(parent).keys[child_index - 1] = moved;
        } else {
            let separator = self.arena.node(parent).keys()[child_index - 1].clone();
            let (lent_key, lent_child) = {
                let left = self.arena.node_mut(left_id);
                let last = left.keys.len() - 1;
                let lent_key = left.keys.remove(last);
                let lent_child = left.children.remove(left.children.len() - 1);
                (lent_key, lent_child)
            };
            {
                let child = self.arena.node_mut(child_id);
                child.keys.insert(0, separator);
                child.children.insert(0, lent_child);
            }
            self.arena.node_mut(parent).keys[child_index - 1] = lent_key;
        }
        metrics.record_write();
        tracer.emit(TraceEvent::Redistribute {
            node: left_id,
            to: child_id,
            parent,
            separator_slot: child_index - 1,
        });
    }

    /// Borrows one key from the right sibling. At the leaf level the parent
    /// separator is rewritten to the sibling's new first key.
    fn redistribute_from_right(
        &mut self,
        parent: NodeId,
        child_index: usize,
        tracer: &mut Tracer<K>,
        metrics: &mut Metrics,
    ) {
        let child_id = self.arena.node(parent).children()[child_index];
        let right_id = self.arena.node(parent).children()[child_index + 1];
        let leaf = self.arena.node(child_id).is_leaf();

        if leaf {
            let moved = self.arena.node_mut(right_id).keys.remove(0);
            self.arena.node_mut(child_id).keys.push(moved);
            let new_separator = self.arena.node(right_id).keys()[0].clone();
            self.arena.node_mut(parent).keys[child_index] = new_separator;
        } else {
            let separator = self.arena.node(parent).keys()[child_index].clone();
            let (lent_key, lent_child) = {
                let right = self.arena.node_mut(right_id);
                (right.keys.remove(0), right.children.remove(0))
            };
            {
                let child = self.arena.node_mut(child_id);
                child.keys.push(separator);
                child.children.push(lent_child);
            }
            self.arena.node_mut(parent).keys[child_index] = lent_key;
        }
        metrics.record_write();
        tracer.emit(TraceEvent::Redistribute {
            node: right_id,
            to: child_id,
            parent,
            separator_slot: child_index,
        });
    }

    /// Merges the child into its left sibling. Leaf merges discard the
    /// separator (it was a copy) and relink the chain; internal merges pull
    /// it down. The absorbed node is freed.
    fn merge_with_left(
        &mut self,
        parent: NodeId,
        child_index: usize,
        tracer: &mut Tracer<K>,
        metrics: &mut Metrics,
    ) {
        let left_id = self.arena.node(parent).children()[child_index - 1];
        let child_id = self.arena.node(parent).children()[child_index];
        let leaf = self.arena.node(child_id).is_leaf();

        let separator = self.arena.node_mut(parent).keys.remove(child_index - 1);
        let (child_keys, child_children, chain_next) = {
            let child = self.arena.node_mut(child_id);
            (
                std::mem::take(&mut child.keys),
                std::mem::take(&mut child.children),
                child.next_leaf,
            )
        };
        {
            let left = self.arena.node_mut(left_id);
            if leaf {
                left.next_leaf = chain_next;
            } else {
                left.keys.push(separator.clone());
            }
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

    /// Merges the right sibling into the child. Mirror of
    /// [`Self::merge_with_left`].
    fn merge_with_right(
        &mut self,
        parent: NodeId,
        child_index: usize,
        tracer: &mut Tracer<K>,
        metrics: &mut Metrics,
    ) {
        let child_id = self.arena.node(parent).children()[child_index];
        let right_id = self.arena.node(parent).children()[child_index + 1];
        let leaf = self.arena.node(child_id).is_leaf();

        let separator = self.arena.node_mut(parent).keys.remove(child_index);
        let (right_keys, right_children, chain_next) = {
            let right = self.arena.node_mut(right_id);
            (
                std::mem::take(&mut right.keys),
                std::mem::take(&mut right.children),
                right.next_leaf,
            )
        };
        {
            let child = self.arena.node_mut(child_id);
            if leaf {
                child.next_leaf = chain_next;
            } else {
                child.keys.push(separator.clone());
            }
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
}

impl<K: TreeKey> TreeOps<K> for BPlusTree<K> {
    fn search(&self, key: &K, tracer: &mut Tracer<K>, metrics: &mut Metrics) -> bool {
        BPlusTree::search(self, key, tracer, metrics)
    }

    fn insert(&mut self, key: K, tracer: &mut Tracer<K>, metrics: &mut Metrics) -> bool {
        BPlusTree::insert(self, key, tracer, metrics)
    }

    fn delete(&mut self, key: &K, tracer: &mut Tracer<K>, metrics: &mut Metrics) -> bool {
        BPlusTree::delete(self, key, tracer, metrics)
    }

    fn key_count(&self) -> usize {
        self.len
    }

    fn keys_in_order(&self) -> Vec<K> {
        let mut out = Vec::with_capacity(self.len);
        let mut current = Some(self.first_leaf());
        while let Some(leaf_id) = current {
            let leaf = self.arena.node(leaf_id);
            out.extend(leaf.keys().iter().cloned());
            current = leaf.next_leaf();
        }
        out
    }

    fn validate(&self) -> std::result::Result<(), InvariantViolation<K>> {
        validate::validate_tree(
            &self.arena,
            self.root,
            self.max_keys,
            self.min_keys,
            SeparatorRule::CopiedUp,
            Some(self.first_leaf()),
        )
    }
}
