//! Error types for Arbor.

use thiserror::Error;

/// Result type alias using ArborError.
pub type Result<T> = std::result::Result<T, ArborError>;

/// Errors that can occur in Arbor operations.
///
/// Duplicate inserts and missing keys are not errors: the engines report
/// them through the `applied`/`found` booleans of the operation API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArborError {
    #[error("fanout must be between {min} and {max}, got {got}")]
    InvalidFanout { got: usize, min: usize, max: usize },

    #[error("key range [{min}, {max}] cannot supply {requested} unique keys")]
    RangeExhausted {
        min: i64,
        max: i64,
        requested: usize,
    },

    #[error("cannot draw {requested} unique strings of length {length}")]
    StringSpaceExhausted { length: usize, requested: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_fanout_display() {
        let err = ArborError::InvalidFanout {
            got: 12,
            min: 3,
            max: 10,
        };
        assert_eq!(err.to_string(), "fanout must be between 3 and 10, got 12");
    }

    #[test]
    fn test_range_exhausted_display() {
        let err = ArborError::RangeExhausted {
            min: 1,
            max: 5,
            requested: 10,
        };
        assert_eq!(
            err.to_string(),
            "key range [1, 5] cannot supply 10 unique keys"
        );
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<u32> {
            Ok(7)
        }

        assert!(returns_ok().is_ok());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ArborError>();
    }
}
