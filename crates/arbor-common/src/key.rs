//! Key abstraction shared by both tree variants.

use serde::Serialize;
use std::fmt;

/// A totally ordered key usable by the tree engines.
///
/// Blanket-implemented, so any sortable, cloneable, printable, serializable
/// type qualifies. The two orderings named in [`crate::config::KeyOrdering`]
/// correspond to `i64` (numeric) and `String` (lexicographic).
pub trait TreeKey: Ord + Clone + fmt::Debug + fmt::Display + Serialize {}

impl<T> TreeKey for T where T: Ord + Clone + fmt::Debug + fmt::Display + Serialize {}
