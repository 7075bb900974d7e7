//! Random-batch drivers for the Arbor tree engines.
//!
//! Generates unique random keys that avoid what a tree already stores, and
//! runs timed bulk insert/remove loops with tracing disabled, reporting
//! per-batch elapsed time and node-access counts.

pub mod generate;
pub mod runner;

pub use generate::{random_uppercase_strings, unique_random_ints};
pub use runner::{batch_insert, batch_remove, choose_delete_keys, BatchReport, DeletePlan};
