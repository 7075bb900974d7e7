//! Trace event vocabulary.
//!
//! Events are the sole channel through which the engines report "what
//! happened" during an operation. Serialized with snake_case tags, this is
//! the compatibility surface the animation layer consumes: renaming or
//! reordering fields breaks external consumers.

use arbor_common::{NodeId, TreeKey};
use serde::Serialize;

/// One recorded step of a tree operation.
///
/// Every event names the node involved; slot indices are exact positions
/// within that node's key sequence at emission time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEvent<K: TreeKey> {
    /// Entered a node; carries a snapshot of its keys for replay.
    VisitNode { node: NodeId, keys: Vec<K> },
    /// Compared the target against the key at `slot`.
    CompareKey {
        node: NodeId,
        slot: usize,
        node_key: K,
        target: K,
    },
    /// Chose the child at `child_index` to continue the descent.
    Descend { node: NodeId, child_index: usize },
    /// Inserted `key` into a leaf at sorted position `slot`.
    InsertInLeaf { node: NodeId, slot: usize, key: K },
    /// Split `node`; `right` is the newly allocated sibling and `promoted`
    /// the key handed to the parent.
    SplitNode {
        node: NodeId,
        right: NodeId,
        promoted: K,
        leaf_split: bool,
    },
    /// The tree grew a level; `node` is the new root.
    NewRoot {
        node: NodeId,
        old_root: NodeId,
        promoted: K,
    },
    /// Located `key` at `slot` during a delete.
    DeleteFound { node: NodeId, slot: usize, key: K },
    /// Removed `key` from a leaf at `slot`.
    DeleteInLeaf { node: NodeId, slot: usize, key: K },
    /// `node` dropped below the minimum occupancy.
    Underflow {
        node: NodeId,
        keys: usize,
        min_keys: usize,
    },
    /// Borrowed one key from `node` into `to`, rotating through the parent
    /// separator at `separator_slot`.
    Redistribute {
        node: NodeId,
        to: NodeId,
        parent: NodeId,
        separator_slot: usize,
    },
    /// Merged `absorbed` into `node`, pulling `separator` down from `parent`.
    Merge {
        node: NodeId,
        absorbed: NodeId,
        parent: NodeId,
        separator: K,
    },
    /// Search located the key at `slot`.
    SearchFound { node: NodeId, slot: usize },
    /// Search exhausted a leaf without a match.
    SearchNotFound { node: NodeId },
    /// The tree shrank a level; `node` is the surviving root.
    ShrinkRoot { node: NodeId, old_root: NodeId },
}

/// Payload-free event tag, for filtering and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    VisitNode,
    CompareKey,
    Descend,
    InsertInLeaf,
    SplitNode,
    NewRoot,
    DeleteFound,
    DeleteInLeaf,
    Underflow,
    Redistribute,
    Merge,
    SearchFound,
    SearchNotFound,
    ShrinkRoot,
}

impl<K: TreeKey> TraceEvent<K> {
    /// The tag of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            TraceEvent::VisitNode { .. } => EventKind::VisitNode,
            TraceEvent::CompareKey { .. } => EventKind::CompareKey,
            TraceEvent::Descend { .. } => EventKind::Descend,
            TraceEvent::InsertInLeaf { .. } => EventKind::InsertInLeaf,
            TraceEvent::SplitNode { .. } => EventKind::SplitNode,
            TraceEvent::NewRoot { .. } => EventKind::NewRoot,
            TraceEvent::DeleteFound { .. } => EventKind::DeleteFound,
            TraceEvent::DeleteInLeaf { .. } => EventKind::DeleteInLeaf,
            TraceEvent::Underflow { .. } => EventKind::Underflow,
            TraceEvent::Redistribute { .. } => EventKind::Redistribute,
            TraceEvent::Merge { .. } => EventKind::Merge,
            TraceEvent::SearchFound { .. } => EventKind::SearchFound,
            TraceEvent::SearchNotFound { .. } => EventKind::SearchNotFound,
            TraceEvent::ShrinkRoot { .. } => EventKind::ShrinkRoot,
        }
    }

    /// The node this event refers to.
    pub fn node(&self) -> NodeId {
        match self {
            TraceEvent::VisitNode { node, .. }
            | TraceEvent::CompareKey { node, .. }
            | TraceEvent::Descend { node, .. }
            | TraceEvent::InsertInLeaf { node, .. }
            | TraceEvent::SplitNode { node, .. }
            | TraceEvent::NewRoot { node, .. }
            | TraceEvent::DeleteFound { node, .. }
            | TraceEvent::DeleteInLeaf { node, .. }
            | TraceEvent::Underflow { node, .. }
            | TraceEvent::Redistribute { node, .. }
            | TraceEvent::Merge { node, .. }
            | TraceEvent::SearchFound { node, .. }
            | TraceEvent::SearchNotFound { node }
            | TraceEvent::ShrinkRoot { node, .. } => *node,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_tags() {
        let event: TraceEvent<i64> = TraceEvent::VisitNode {
            node: NodeId::new(3),
            keys: vec![10, 20],
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"visit_node""#), "{json}");
        assert!(json.contains(r#""keys":[10,20]"#), "{json}");

        let event: TraceEvent<i64> = TraceEvent::SearchNotFound {
            node: NodeId::new(9),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"search_not_found""#), "{json}");
    }

    #[test]
    fn test_kind_matches_variant() {
        let event: TraceEvent<i64> = TraceEvent::Underflow {
            node: NodeId::new(1),
            keys: 0,
            min_keys: 1,
        };
        assert_eq!(event.kind(), EventKind::Underflow);
        assert_eq!(event.node(), NodeId::new(1));
    }

    #[test]
    fn test_string_keys_serialize() {
        let event: TraceEvent<String> = TraceEvent::CompareKey {
            node: NodeId::new(0),
            slot: 1,
            node_key: "LUA".to_string(),
            target: "MAR".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""node_key":"LUA""#), "{json}");
    }
}
