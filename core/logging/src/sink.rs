//! Panic-safe [`EventSink`] wrapper and structured tracing emission.

use agentkit_types::{Event, EventKind, EventSink};

/// Wraps an embedder-supplied [`EventSink`], logging every event at
/// `tracing::debug` and never letting a panic inside the inner sink
/// propagate into the state machine.
pub struct SessionLogger<S> {
    inner: S,
}

impl<S: EventSink> SessionLogger<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: EventSink> EventSink for SessionLogger<S> {
    fn emit(&self, event: Event) {
        tracing::debug!(
            task_id = %event.task_id,
            domain_id = %event.domain_id,
            kind = ?event.event_kind,
            "event emitted"
        );
        let task_id = event.task_id.clone();
        let kind = event.event_kind.clone();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.inner.emit(event)));
        if outcome.is_err() {
            tracing::error!(task_id = %task_id, kind = ?kind, "event sink panicked handling event; dropped");
        }
    }
}

/// An [`EventSink`] that discards everything, for embedders (and tests)
/// that don't want a live UI callback.
#[derive(Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: Event) {}
}

/// Fan out one event to every sink in the list: the session logger and a
/// UI callback commonly need to coexist.
pub struct BroadcastEventSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl BroadcastEventSink {
    pub fn new(sinks: Vec<Box<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for BroadcastEventSink {
    fn emit(&self, event: Event) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSink(Arc<AtomicUsize>);
    impl EventSink for CountingSink {
        fn emit(&self, _event: Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct PanickingSink;
    impl EventSink for PanickingSink {
        fn emit(&self, _event: Event) {
            panic!("boom");
        }
    }

    fn sample_event() -> Event {
        Event::new(EventKind::State, "t1", "coder", serde_json::json!({}))
    }

    #[test]
    fn forwards_events_to_inner_sink() {
        let count = Arc::new(AtomicUsize::new(0));
        let logger = SessionLogger::new(CountingSink(count.clone()));
        logger.emit(sample_event());
        logger.emit(sample_event());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn contains_a_panicking_inner_sink() {
        let logger = SessionLogger::new(PanickingSink);
        // must not unwind out of emit()
        logger.emit(sample_event());
    }

    #[test]
    fn broadcast_reaches_every_sink() {
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        let broadcast = BroadcastEventSink::new(vec![
            Box::new(CountingSink(a.clone())),
            Box::new(CountingSink(b.clone())),
        ]);
        broadcast.emit(sample_event());
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }
}
