//! Structural invariant validation.
//!
//! A read-only traversal that certifies a whole tree after a mutation and
//! reports the first violation together with the offending node. Separator
//! bounds are checked transitively: every node's keys must fall inside the
//! window its ancestors' separators imply, which catches rotations and
//! merges that left a stale separator behind.

use crate::arena::NodeArena;
use arbor_common::{NodeId, TreeKey};
use thiserror::Error;

/// How separators relate to the keys below them, which decides the bound
/// convention applied during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorRule {
    /// B-Tree: a promoted key leaves the child, so a separator is the
    /// *upper* bound of its left subtree inclusively: keys in `(lower, upper]`.
    MovedUp,
    /// B+-Tree: a separator is a copy of the right subtree's first leaf
    /// key: keys in `[lower, upper)`.
    CopiedUp,
}

/// First structural defect found, with the node it was found in.
#[derive(Debug, Error, PartialEq)]
pub enum InvariantViolation<K: TreeKey> {
    #[error("node {node} holds {keys} keys, above the maximum {max_keys}")]
    Overflow {
        node: NodeId,
        keys: usize,
        max_keys: usize,
    },
    #[error("node {node} holds {keys} keys, below the minimum {min_keys}")]
    Underflow {
        node: NodeId,
        keys: usize,
        min_keys: usize,
    },
    #[error("node {node} keys out of order at slot {slot}: {prev} before {next}")]
    KeyOrder {
        node: NodeId,
        slot: usize,
        prev: K,
        next: K,
    },
    #[error("node {node} key {key} escapes the window set by ancestor separators")]
    KeyOutOfBounds { node: NodeId, key: K },
    #[error("node {node} has {children} children for {keys} keys")]
    ChildCount {
        node: NodeId,
        keys: usize,
        children: usize,
    },
    #[error("leaf {node} at depth {depth}, other leaves at {expected}")]
    LeafDepth {
        node: NodeId,
        depth: usize,
        expected: usize,
    },
    #[error("key {key} stored more than once")]
    DuplicateKey { key: K },
    #[error("leaf chain diverges from tree order at {node}")]
    LeafChain { node: NodeId },
}

/// Validates the tree rooted at `root`. `first_leaf` enables the leaf-chain
/// check and is only passed by the B+-Tree engine.
pub(crate) fn validate_tree<K: TreeKey>(
    arena: &NodeArena<K>,
    root: NodeId,
    max_keys: usize,
    min_keys: usize,
    rule: SeparatorRule,
    first_leaf: Option<NodeId>,
) -> Result<(), InvariantViolation<K>> {
    let mut checker = Checker {
        arena,
        root,
        max_keys,
        min_keys,
        rule,
        leaf_depth: None,
        leaves: Vec::new(),
        ordered_keys: Vec::new(),
    };
    checker.check(root, None, None, 0)?;

    // Global uniqueness over the ordered key sequence; the bound checks
    // above already guarantee ordering across subtrees up to equality.
    for pair in checker.ordered_keys.windows(2) {
        if pair[0] == pair[1] {
            return Err(InvariantViolation::DuplicateKey {
                key: pair[0].clone(),
            });
        }
    }

    if let Some(first) = first_leaf {
        let mut chain = Vec::new();
        let mut current = Some(first);
        while let Some(id) = current {
            chain.push(id);
            current = arena.node(id).next_leaf();
        }
        if chain != checker.leaves {
            let idx = chain
                .iter()
                .zip(checker.leaves.iter())
                .position(|(a, b)| a != b)
                .unwrap_or_else(|| chain.len().min(checker.leaves.len()));
            let node = chain
                .get(idx)
                .or_else(|| checker.leaves.get(idx))
                .copied()
                .unwrap_or(first);
            return Err(InvariantViolation::LeafChain { node });
        }
    }

    Ok(())
}

struct Checker<'a, K: TreeKey> {
    arena: &'a NodeArena<K>,
    root: NodeId,
    max_keys: usize,
    min_keys: usize,
    rule: SeparatorRule,
    leaf_depth: Option<usize>,
    leaves: Vec<NodeId>,
    ordered_keys: Vec<K>,
}

impl<K: TreeKey> Checker<'_, K> {
    fn check(
        &mut self,
        node_id: NodeId,
        lower: Option<&K>,
        upper: Option<&K>,
        depth: usize,
    ) -> Result<(), InvariantViolation<K>> {
        let node = self.arena.node(node_id);
        let keys = node.keys();

        if keys.len() > self.max_keys {
            return Err(InvariantViolation::Overflow {
                node: node_id,
                keys: keys.len(),
                max_keys: self.max_keys,
            });
        }
        if node_id != self.root && keys.len() < self.min_keys {
            return Err(InvariantViolation::Underflow {
                node: node_id,
                keys: keys.len(),
                min_keys: self.min_keys,
            });
        }
        // A root that is still internal must separate at least two children.
        if node_id == self.root && !node.is_leaf() && keys.is_empty() {
            return Err(InvariantViolation::Underflow {
                node: node_id,
                keys: 0,
                min_keys: 1,
            });
        }

        for (slot, pair) in keys.windows(2).enumerate() {
            if pair[0] >= pair[1] {
                return Err(InvariantViolation::KeyOrder {
                    node: node_id,
                    slot,
                    prev: pair[0].clone(),
                    next: pair[1].clone(),
                });
            }
        }

        for key in keys {
            let below = match (self.rule, lower) {
                (_, None) => false,
                (SeparatorRule::MovedUp, Some(lo)) => key <= lo,
                (SeparatorRule::CopiedUp, Some(lo)) => key < lo,
            };
            let above = match (self.rule, upper) {
                (_, None) => false,
                (SeparatorRule::MovedUp, Some(hi)) => key > hi,
                (SeparatorRule::CopiedUp, Some(hi)) => key >= hi,
            };
            if below || above {
                return Err(InvariantViolation::KeyOutOfBounds {
                    node: node_id,
                    key: key.clone(),
                });
            }
        }

        if node.is_leaf() {
            match self.leaf_depth {
                None => self.leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(InvariantViolation::LeafDepth {
                        node: node_id,
                        depth,
                        expected,
                    });
                }
                Some(_) => {}
            }
            self.leaves.push(node_id);
            self.ordered_keys.extend(keys.iter().cloned());
            return Ok(());
        }

        if node.children().len() != keys.len() + 1 {
            return Err(InvariantViolation::ChildCount {
                node: node_id,
                keys: keys.len(),
                children: node.children().len(),
            });
        }

        for (i, child) in node.children().iter().enumerate() {
            let child_lower = if i == 0 { lower } else { Some(&keys[i - 1]) };
            let child_upper = if i == keys.len() {
                upper
            } else {
                Some(&keys[i])
            };
            self.check(*child, child_lower, child_upper, depth + 1)?;
            // Internal keys participate in the ordered sequence only when
            // they are real occupants, not routing copies.
            if self.rule == SeparatorRule::MovedUp && i < keys.len() {
                self.ordered_keys.push(keys[i].clone());
            }
        }
        Ok(())
    }
}
