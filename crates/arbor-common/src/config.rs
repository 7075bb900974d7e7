//! Configuration accepted at tree creation.

use crate::error::{ArborError, Result};
use serde::{Deserialize, Serialize};

/// Smallest permitted fanout.
pub const MIN_FANOUT: usize = 3;

/// Largest permitted fanout.
pub const MAX_FANOUT: usize = 10;

/// Key ordering selected at tree creation, fixed for the tree's lifetime.
///
/// Collaborators use this to decide which key type to instantiate a tree
/// with: `Numeric` maps to `i64` keys, `Lexicographic` to `String` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyOrdering {
    /// Signed 64-bit integer keys compared numerically.
    #[default]
    Numeric,
    /// String keys compared lexicographically.
    Lexicographic,
}

/// Configuration for one tree instance.
///
/// The fanout bounds the node shape for the tree's whole lifetime; changing
/// it requires discarding and recreating the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum number of children of an internal node (3-10 inclusive).
    pub fanout: usize,
    /// Key comparison order for this tree.
    pub ordering: KeyOrdering,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            fanout: 4,
            ordering: KeyOrdering::Numeric,
        }
    }
}

impl TreeConfig {
    /// Creates a validated configuration.
    pub fn new(fanout: usize, ordering: KeyOrdering) -> Result<Self> {
        validate_fanout(fanout)?;
        Ok(Self { fanout, ordering })
    }

    /// Maximum number of children of an internal node.
    pub fn max_children(&self) -> usize {
        self.fanout
    }

    /// Maximum number of keys any node may hold.
    pub fn max_keys(&self) -> usize {
        self.fanout - 1
    }

    /// Minimum number of keys a non-root node must hold: ceil(fanout/2) - 1.
    pub fn min_keys(&self) -> usize {
        (self.fanout + 1) / 2 - 1
    }
}

/// Rejects fanouts outside [MIN_FANOUT, MAX_FANOUT] before any tree is built.
pub fn validate_fanout(fanout: usize) -> Result<()> {
    if !(MIN_FANOUT..=MAX_FANOUT).contains(&fanout) {
        return Err(ArborError::InvalidFanout {
            got: fanout,
            min: MIN_FANOUT,
            max: MAX_FANOUT,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = TreeConfig::default();
        assert_eq!(config.fanout, 4);
        assert_eq!(config.ordering, KeyOrdering::Numeric);
        assert_eq!(config.max_children(), 4);
        assert_eq!(config.max_keys(), 3);
        assert_eq!(config.min_keys(), 1);
    }

    #[test]
    fn test_derived_limits_per_fanout() {
        // (fanout, max_keys, min_keys)
        for (fanout, max_keys, min_keys) in
            [(3, 2, 1), (4, 3, 1), (5, 4, 2), (6, 5, 2), (10, 9, 4)]
        {
            let config = TreeConfig::new(fanout, KeyOrdering::Numeric).unwrap();
            assert_eq!(config.max_keys(), max_keys, "fanout {fanout}");
            assert_eq!(config.min_keys(), min_keys, "fanout {fanout}");
        }
    }

    #[test]
    fn test_fanout_bounds_rejected() {
        for fanout in [0, 1, 2, 11, 100] {
            let err = TreeConfig::new(fanout, KeyOrdering::Numeric).unwrap_err();
            assert!(matches!(err, ArborError::InvalidFanout { got, .. } if got == fanout));
        }
    }

    #[test]
    fn test_fanout_bounds_accepted() {
        for fanout in MIN_FANOUT..=MAX_FANOUT {
            assert!(validate_fanout(fanout).is_ok());
        }
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let original = TreeConfig::new(5, KeyOrdering::Lexicographic).unwrap();
        let serialized = serde_json::to_string(&original).unwrap();
        assert!(serialized.contains("lexicographic"));
        let deserialized: TreeConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(original, deserialized);
    }
}
