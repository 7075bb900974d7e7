//! Balanced multiway search tree engines.
//!
//! Two structural variants over one arena-based node model:
//!
//! - [`BTree`]: keys in every node, split medians *moved* to the parent,
//!   reactive bottom-up underflow resolution on delete.
//! - [`BPlusTree`]: keys only in the leaves, split medians *copied* to the
//!   parent, and a linked leaf chain serving range and sequential scans.
//!
//! Every operation reports its primitive steps through an
//! [`arbor_trace::Tracer`] and its node accesses through
//! [`arbor_trace::Metrics`]. After any mutation, [`TreeOps::validate`]
//! certifies the full set of structural invariants for the variant.

pub mod arena;
pub mod bplustree;
pub mod btree;
pub mod ops;
pub mod scan;
pub mod validate;

pub use arena::{Node, NodeArena};
pub use bplustree::BPlusTree;
pub use btree::BTree;
pub use ops::TreeOps;
pub use scan::RangeScan;
pub use validate::{InvariantViolation, SeparatorRule};
