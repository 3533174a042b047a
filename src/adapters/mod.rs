//! Infrastructure Adapters
//!
//! Adapter implementations for the domain ports.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Domain Layer                              │
//! │          ResourceFetcher        │        LoadEventSink           │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters (This Module)                       │
//! │  HttpFetcher │ LoggingEventSink │ InMemoryEventCollector         │
//! │  CompositeEventSink │ PrometheusExporter                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod event_sink;
mod http;
mod prometheus;

pub use event_sink::{CompositeEventSink, InMemoryEventCollector, LoggingEventSink};
pub use http::{HttpFetcher, USER_AGENT};
pub use self::prometheus::PrometheusExporter;
