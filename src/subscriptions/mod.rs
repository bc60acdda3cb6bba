//! Live per-series subscriptions.
//!
//! Every accepted sample is fanned out to the subscribers registered for its
//! `(game, series)` pair before `append_sample` returns. How a delivery
//! behaves when the subscriber is not keeping up is chosen once per store
//! through [`DeliveryPolicy`]:
//! - `Blocking` hands the event over directly and waits for the receiver
//! - `Buffered` queues up to `capacity` events and discards the oldest
//! - `Timeout` waits a bounded time and then skips that subscriber
//!
//! Under `Blocking`, a subscriber that stops receiving without closing its
//! [`Subscription`] stalls every writer of the store. Closing (or dropping)
//! the handle cancels any in-flight send before it unregisters.
//!
//! # Example
//!
//! ```ignore
//! let store = Store::new();
//! let subscription = store.subscribe("match-1", "health");
//!
//! std::thread::spawn(move || {
//!     for event in subscription.iter() {
//!         println!("{} = {}", event.name, event.time_value.value());
//!     }
//! });
//!
//! store.append_sample("match-1", "health", 97);
//! ```

mod subscriber;
mod types;

pub(crate) use subscriber::{Delivery, Subscriber};
pub use types::{DeliveryPolicy, SubscriberId, Subscription};
