//! Append-only event log for one operation.

use crate::event::TraceEvent;
use arbor_common::TreeKey;

/// Per-operation event sink.
///
/// The log is append-only and strictly ordered by emission time. Engines
/// receive a tracer per operation and never retain it; callers replay the
/// recorded events or discard them. Batch drivers disable tracing to avoid
/// paying for events nobody will replay.
#[derive(Debug, Clone)]
pub struct Tracer<K: TreeKey> {
    events: Vec<TraceEvent<K>>,
    enabled: bool,
    op_id: u64,
}

impl<K: TreeKey> Tracer<K> {
    /// Creates an enabled tracer with an empty log.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            enabled: true,
            op_id: 0,
        }
    }

    /// Creates a tracer that drops every event.
    pub fn disabled() -> Self {
        Self {
            events: Vec::new(),
            enabled: false,
            op_id: 0,
        }
    }

    /// Appends an event if tracing is enabled.
    pub fn emit(&mut self, event: TraceEvent<K>) {
        if self.enabled {
            self.events.push(event);
        }
    }

    /// Drops all recorded events and advances the operation id.
    pub fn clear(&mut self) {
        self.events.clear();
        self.op_id += 1;
    }

    /// The recorded events, in emission order.
    pub fn events(&self) -> &[TraceEvent<K>] {
        &self.events
    }

    /// Consumes the tracer, yielding the recorded events.
    pub fn into_events(self) -> Vec<TraceEvent<K>> {
        self.events
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Identifier of the operation currently being traced.
    pub fn op_id(&self) -> u64 {
        self.op_id
    }

    /// Resumes event recording.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Suspends event recording.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Whether events are currently recorded.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl<K: TreeKey> Default for Tracer<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_common::NodeId;

    fn visit(n: u64) -> TraceEvent<i64> {
        TraceEvent::VisitNode {
            node: NodeId::new(n),
            keys: vec![],
        }
    }

    #[test]
    fn test_emit_preserves_order() {
        let mut tracer = Tracer::new();
        tracer.emit(visit(1));
        tracer.emit(visit(2));
        tracer.emit(visit(3));
        let nodes: Vec<u64> = tracer.events().iter().map(|e| e.node().as_u64()).collect();
        assert_eq!(nodes, vec![1, 2, 3]);
    }

    #[test]
    fn test_disabled_tracer_records_nothing() {
        let mut tracer = Tracer::disabled();
        tracer.emit(visit(1));
        assert!(tracer.is_empty());

        tracer.enable();
        tracer.emit(visit(2));
        assert_eq!(tracer.len(), 1);

        tracer.disable();
        tracer.emit(visit(3));
        assert_eq!(tracer.len(), 1);
    }

    #[test]
    fn test_clear_advances_op_id() {
        let mut tracer: Tracer<i64> = Tracer::new();
        assert_eq!(tracer.op_id(), 0);
        tracer.emit(visit(1));
        tracer.clear();
        assert!(tracer.is_empty());
        assert_eq!(tracer.op_id(), 1);
    }
}
