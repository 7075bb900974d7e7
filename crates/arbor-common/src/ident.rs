//! Stable node identity tokens.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity token of one tree node.
///
/// Trace events refer to nodes through these tokens rather than structural
/// references, so an event log stays meaningful after the tree mutates.
/// Within one tree's lifetime a token is never reassigned to another node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Creates a token from its raw value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value of the token.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::new(7).to_string(), "#7");
    }

    #[test]
    fn test_node_id_roundtrip() {
        let id = NodeId::new(42);
        assert_eq!(id.as_u64(), 42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
    }
}
