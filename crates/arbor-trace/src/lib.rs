//! Event tracing and metrics for Arbor tree operations.
//!
//! Engines emit one [`TraceEvent`] per primitive step (visit, compare,
//! descend, mutate) into a caller-supplied [`Tracer`]; the resulting log
//! drives step-by-step replay in the UI. [`Metrics`] tallies node accesses
//! and wall-clock time per operation or batch.

pub mod event;
pub mod metrics;
pub mod tracer;

pub use event::{EventKind, TraceEvent};
pub use metrics::Metrics;
pub use tracer::Tracer;
