//! Event Sink Adapters
//!
//! Implements the `LoadEventSink` port with various backends.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::domain::{LoadEvent, LoadEventSink};

/// Logging-based event sink.
///
/// Writes each load event to the tracing system as JSON.
#[derive(Debug, Clone, Default)]
pub struct LoggingEventSink {
    /// Whether to log events at info level (true) or debug level (false)
    info_level: bool,
}

impl LoggingEventSink {
    /// Create a sink that logs at debug level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that logs at info level.
    pub fn info_level() -> Self {
        Self { info_level: true }
    }

    /// Create a sink that logs at debug level.
    pub fn debug_level() -> Self {
        Self { info_level: false }
    }
}

impl LoadEventSink for LoggingEventSink {
    fn publish(&self, event: &LoadEvent) {
        let event_type = event.event_type();
        let json = serde_json::to_string(event).unwrap_or_else(|_| format!("{:?}", event));

        if self.info_level {
            info!(event_type = %event_type, event = %json, "Load event");
        } else {
            debug!(event_type = %event_type, event = %json, "Load event");
        }
    }
}

/// In-memory event collector.
///
/// Keeps events for later inspection, mostly from tests.
#[derive(Debug, Default)]
pub struct InMemoryEventCollector {
    events: RwLock<Vec<LoadEvent>>,
}

impl InMemoryEventCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// All collected events.
    pub fn events(&self) -> Vec<LoadEvent> {
        self.events.read().clone()
    }

    /// Number of collected events.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// No events collected.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Drop all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Events of one type (`Loaded`, `CacheHit`, `Failed`).
    pub fn events_of_type(&self, event_type: &str) -> Vec<LoadEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .cloned()
            .collect()
    }

    /// Failed attempts only.
    pub fn failures(&self) -> Vec<LoadEvent> {
        self.events_of_type("Failed")
    }
}

impl LoadEventSink for InMemoryEventCollector {
    fn publish(&self, event: &LoadEvent) {
        self.events.write().push(event.clone());
    }
}

/// Fans each event out to several sinks in registration order.
#[derive(Default)]
pub struct CompositeEventSink {
    sinks: Vec<Arc<dyn LoadEventSink>>,
}

impl CompositeEventSink {
    /// Create an empty composite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    pub fn with_sink(mut self, sink: Arc<dyn LoadEventSink>) -> Self {
        self.push(sink);
        self
    }

    /// Add a sink in place.
    pub fn push(&mut self, sink: Arc<dyn LoadEventSink>) {
        self.sinks.push(sink);
    }

    /// Number of sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// No sinks registered.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for CompositeEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeEventSink")
            .field("sink_count", &self.sinks.len())
            .finish()
    }
}

impl LoadEventSink for CompositeEventSink {
    fn publish(&self, event: &LoadEvent) {
        for sink in &self.sinks {
            sink.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_sink() {
        let sink = LoggingEventSink::info_level();

        // Should not panic
        sink.publish(&LoadEvent::success("https://cdn/a.jpg", 10, 100));
        LoggingEventSink::new().publish(&LoadEvent::failure("https://cdn/b.jpg", 10));
    }

    #[test]
    fn test_in_memory_collector() {
        let collector = InMemoryEventCollector::new();
        assert!(collector.is_empty());

        collector.publish(&LoadEvent::success("a", 10, 1));
        collector.publish(&LoadEvent::cache_hit("a", 1));
        collector.publish(&LoadEvent::failure("b", 10));

        assert_eq!(collector.len(), 3);
        assert_eq!(collector.events_of_type("CacheHit").len(), 1);
        assert_eq!(collector.failures()[0].source_url, "b");

        collector.clear();
        assert!(collector.is_empty());
    }

    #[test]
    fn test_composite_sink() {
        let first = Arc::new(InMemoryEventCollector::new());
        let second = Arc::new(InMemoryEventCollector::new());
        let composite = CompositeEventSink::new()
            .with_sink(first.clone())
            .with_sink(Arc::new(LoggingEventSink::debug_level()))
            .with_sink(second.clone());
        assert_eq!(composite.len(), 3);

        composite.publish(&LoadEvent::success("a", 1, 1));
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }
}
