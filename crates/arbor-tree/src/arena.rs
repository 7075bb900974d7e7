//! Arena-based allocation for tree nodes.
//!
//! Every node of one tree lives in a single arena and is referenced by a
//! stable [`NodeId`]. Identity tokens are never reused within a tree's
//! lifetime, so a trace replay can still name nodes that a later merge
//! destroyed. Ownership of the node graph rests with the arena; child and
//! leaf-chain references are plain ids, never owning links.

use arbor_common::{NodeId, TreeKey};

/// A single tree node.
///
/// Internal nodes hold `keys.len() + 1` child ids; leaves hold no children.
/// `next_leaf` is only populated by the B+-Tree engine and is a non-owning
/// cross-reference into a sibling-owned node.
#[derive(Debug, Clone)]
pub struct Node<K> {
    id: NodeId,
    pub(crate) keys: Vec<K>,
    pub(crate) children: Vec<NodeId>,
    leaf: bool,
    pub(crate) next_leaf: Option<NodeId>,
}

impl<K> Node<K> {
    fn new(id: NodeId, leaf: bool) -> Self {
        Self {
            id,
            keys: Vec::new(),
            children: Vec::new(),
            leaf,
            next_leaf: None,
        }
    }

    /// Identity token of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Child ids; empty for leaves.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    /// The next leaf in key order (B+-Tree leaves only).
    pub fn next_leaf(&self) -> Option<NodeId> {
        self.next_leaf
    }
}

/// Arena owning every node of one tree.
#[derive(Debug, Clone)]
pub struct NodeArena<K> {
    slots: Vec<Option<Node<K>>>,
    live: usize,
}

impl<K> NodeArena<K> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
        }
    }

    /// Allocates a fresh node and returns its identity token.
    pub fn alloc(&mut self, leaf: bool) -> NodeId {
        let id = NodeId::new(self.slots.len() as u64);
        self.slots.push(Some(Node::new(id, leaf)));
        self.live += 1;
        id
    }

    /// Borrows a live node.
    ///
    /// Panics on a stale or foreign id; engines only hold ids they own.
    pub fn node(&self, id: NodeId) -> &Node<K> {
        match self.slots.get(id.as_u64() as usize).and_then(Option::as_ref) {
            Some(node) => node,
            None => panic!("stale node id {id}"),
        }
    }

    /// Mutably borrows a live node.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<K> {
        match self
            .slots
            .get_mut(id.as_u64() as usize)
            .and_then(Option::as_mut)
        {
            Some(node) => node,
            None => panic!("stale node id {id}"),
        }
    }

    /// Destroys a node. The caller must have relinked any leaf-chain
    /// neighbors beforehand; the id is retired, not recycled.
    pub fn free(&mut self, id: NodeId) {
        let slot = match self.slots.get_mut(id.as_u64() as usize) {
            Some(slot) => slot,
            None => panic!("stale node id {id}"),
        };
        if slot.take().is_some() {
            self.live -= 1;
        }
    }

    /// Number of live nodes.
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// True if the id refers to a live node.
    pub fn is_live(&self, id: NodeId) -> bool {
        self.slots
            .get(id.as_u64() as usize)
            .is_some_and(Option::is_some)
    }
}

impl<K> Default for NodeArena<K> {
    fn default() -> Self {
        Self::new()
    }
}
