//! Node access counters and operation timing.

use std::time::{Duration, Instant};

/// Performance counters for one operation or one batch.
///
/// The read counter advances exactly once per VISIT_NODE event; the write
/// counter advances once per node mutation. Counters are monotonic until
/// explicitly reset and read-only to collaborators.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    reads: u64,
    writes: u64,
    timer_start: Option<Instant>,
    last_elapsed: Option<Duration>,
}

impl Metrics {
    /// Creates zeroed metrics with no timer running.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one node read (a node visit).
    pub fn record_read(&mut self) {
        self.reads += 1;
    }

    /// Counts one node write (a node mutation).
    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    /// Number of node reads.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Number of node writes.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Total node accesses attributed to visits.
    pub fn node_accesses(&self) -> u64 {
        self.reads
    }

    /// Combined reads and writes, used for batch summaries.
    pub fn total_accesses(&self) -> u64 {
        self.reads + self.writes
    }

    /// Zeroes the access counters, leaving timing untouched.
    pub fn reset_accesses(&mut self) {
        self.reads = 0;
        self.writes = 0;
    }

    /// Starts the wall-clock timer.
    pub fn start_timer(&mut self) {
        self.timer_start = Some(Instant::now());
    }

    /// Stops the timer and returns the elapsed duration.
    ///
    /// Returns zero if the timer was never started.
    pub fn stop_timer(&mut self) -> Duration {
        let elapsed = self
            .timer_start
            .take()
            .map(|start| start.elapsed())
            .unwrap_or_default();
        self.last_elapsed = Some(elapsed);
        elapsed
    }

    /// Duration of the most recent timed measurement.
    pub fn last_elapsed(&self) -> Option<Duration> {
        self.last_elapsed
    }

    /// Resets counters and timing.
    pub fn reset_all(&mut self) {
        self.reset_accesses();
        self.timer_start = None;
        self.last_elapsed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let mut metrics = Metrics::new();
        metrics.record_read();
        metrics.record_read();
        metrics.record_write();
        assert_eq!(metrics.reads(), 2);
        assert_eq!(metrics.writes(), 1);
        assert_eq!(metrics.node_accesses(), 2);
        assert_eq!(metrics.total_accesses(), 3);
    }

    #[test]
    fn test_reset_accesses_keeps_timing() {
        let mut metrics = Metrics::new();
        metrics.record_read();
        metrics.start_timer();
        let elapsed = metrics.stop_timer();
        metrics.reset_accesses();
        assert_eq!(metrics.reads(), 0);
        assert_eq!(metrics.last_elapsed(), Some(elapsed));
    }

    #[test]
    fn test_stop_without_start_is_zero() {
        let mut metrics = Metrics::new();
        assert_eq!(metrics.stop_timer(), Duration::ZERO);
    }

    #[test]
    fn test_reset_all() {
        let mut metrics = Metrics::new();
        metrics.record_write();
        metrics.start_timer();
        metrics.stop_timer();
        metrics.reset_all();
        assert_eq!(metrics.total_accesses(), 0);
        assert!(metrics.last_elapsed().is_none());
    }
}
