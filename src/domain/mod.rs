//! Domain Layer
//!
//! - **Ports** (`ports.rs`) - Trait abstractions for the network and for event consumers
//! - **Events** (`events.rs`) - The immutable load outcome record
//!
//! # Usage
//!
//! ```ignore
//! use mediaflow::domain::{LoadEvent, ResourceFetcher};
//!
//! async fn warm<F: ResourceFetcher>(fetcher: &F, url: &str) -> Result<usize> {
//!     Ok(fetcher.fetch(url).await?.len())
//! }
//! ```

pub mod events;
pub mod ports;

pub use events::LoadEvent;
pub use ports::{CacheEvictionListener, LoadEventSink, ResourceFetcher};
