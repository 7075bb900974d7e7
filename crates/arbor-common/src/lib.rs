//! Arbor common types, errors, and utilities.
//!
//! This crate provides shared definitions used across all Arbor components.

pub mod config;
pub mod error;
pub mod ident;
pub mod key;

pub use config::{KeyOrdering, TreeConfig, MAX_FANOUT, MIN_FANOUT};
pub use error::{ArborError, Result};
pub use ident::NodeId;
pub use key::TreeKey;
