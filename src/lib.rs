//! # Livegraph
//!
//! An in-memory store of timestamped integer samples, grouped into named
//! series under named games, with live per-series subscriptions.
//!
//! ## Core Concepts
//!
//! - **Samples**: Immutable `(timestamp, value)` observations
//! - **Series**: Time-ordered samples, trimmed to a sliding retention window
//! - **Games**: Namespaces of series plus their subscriber registries
//! - **Subscriptions**: Synchronous fan-out of each accepted sample
//!
//! ## Example
//!
//! ```ignore
//! use livegraph::{Store, StoreConfig, DeliveryPolicy};
//!
//! let store = Store::with_config(StoreConfig {
//!     delivery: DeliveryPolicy::Buffered { capacity: 64 },
//!     ..Default::default()
//! });
//!
//! let subscription = store.subscribe("match-1", "health");
//! store.append_sample("match-1", "health", 97);
//!
//! let event = subscription.recv()?;
//! assert_eq!(event.time_value.value(), 97);
//!
//! let data = store.data("match-1");
//! assert_eq!(data.series[0].values.len(), 1);
//! ```

pub mod clock;
pub mod error;
mod game;
mod series;
pub mod store;
pub mod subscriptions;
pub mod types;
pub mod wire;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, StoreError};
pub use store::{EvictionScope, Store, StoreConfig, DEFAULT_RETENTION};
pub use subscriptions::{DeliveryPolicy, SubscriberId, Subscription};
pub use types::{GameData, NewSample, Sample, SeriesSnapshot, Timestamp};
