//! Main Store struct tying games, retention and fan-out together.

use crate::clock::{Clock, SystemClock};
use crate::game::Game;
use crate::subscriptions::{Delivery, DeliveryPolicy, Subscriber, SubscriberId, Subscription};
use crate::types::{GameData, NewSample, Sample};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default sliding window kept per series.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(15);

/// Which series an append trims.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EvictionScope {
    /// Only the series being appended to.
    #[default]
    TouchedSeries,
    /// Every series of the game being appended to.
    WholeGame,
}

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Samples older than `now - retention` are evicted on append.
    pub retention: Duration,

    /// Behaviour of each per-subscriber delivery.
    pub delivery: DeliveryPolicy,

    /// Which series an append trims.
    pub eviction: EvictionScope,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            delivery: DeliveryPolicy::Blocking,
            eviction: EvictionScope::TouchedSeries,
        }
    }
}

/// Everything behind the store's lock.
#[derive(Default)]
pub(crate) struct StoreState {
    games: HashMap<String, Game>,
}

impl StoreState {
    fn game_mut(&mut self, name: &str) -> &mut Game {
        self.games.entry(name.to_string()).or_insert_with(|| {
            tracing::info!(game = %name, "Adding game");
            Game::new(name)
        })
    }

    pub(crate) fn remove_subscriber(&mut self, game: &str, series: &str, id: SubscriberId) -> bool {
        let removed = self
            .games
            .get_mut(game)
            .is_some_and(|g| g.remove_subscriber(series, id));
        if removed {
            tracing::info!(game = %game, series = %series, subscriber = %id, "Removed subscription");
        }
        removed
    }
}

/// The sample store.
///
/// One reader/writer lock guards every game, series and subscriber set.
/// Reads share it; appends, subscribes and unsubscribes take it exclusively.
/// An append evicts, appends and delivers to every subscriber while holding
/// the lock, so subscribers have seen each sample before the next append
/// starts.
///
/// With [`DeliveryPolicy::Blocking`] a subscriber that stops receiving
/// without closing stalls every writer. A subscriber thread must not call
/// back into the store while an append may be delivering to it.
pub struct Store {
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    state: Arc<RwLock<StoreState>>,
    next_subscriber: AtomicU64,
}

impl Store {
    /// Create a store with default configuration and the wall clock.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create a store with `config` and the wall clock.
    pub fn with_config(config: StoreConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Create a store that reads time from `clock`.
    pub fn with_clock(config: StoreConfig, clock: impl Clock + 'static) -> Self {
        Self {
            config,
            clock: Arc::new(clock),
            state: Arc::new(RwLock::new(StoreState::default())),
            next_subscriber: AtomicU64::new(1),
        }
    }

    // --- Reads ---

    /// Snapshot of every series in `game`.
    ///
    /// An unknown game yields empty data and is not created.
    pub fn data(&self, game: &str) -> GameData {
        self.state
            .read()
            .games
            .get(game)
            .map(Game::snapshot)
            .unwrap_or_default()
    }

    /// Names of all known games, sorted.
    pub fn games(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().games.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of subscribers registered for `(game, series)`.
    pub fn subscriber_count(&self, game: &str, series: &str) -> usize {
        self.state
            .read()
            .games
            .get(game)
            .map_or(0, |g| g.subscriber_count(series))
    }

    // --- Writes ---

    /// Record `value` in `(game, name)` stamped with the current time.
    ///
    /// Creates the game and series on first use and evicts samples older
    /// than the retention window first. If the clock has stepped back
    /// behind the series' newest sample, the new sample reuses that
    /// sample's timestamp so stored order stays call order. Returns after
    /// every subscriber of the series has been handed the new sample (per
    /// the delivery policy).
    pub fn append_sample(&self, game: &str, name: &str, value: i32) -> Sample {
        let mut state = self.state.write();

        let now = self.clock.now();
        let cutoff = now.saturating_sub(self.config.retention);

        let game_entry = state.game_mut(game);
        let evicted = match self.config.eviction {
            EvictionScope::TouchedSeries => game_entry.series_mut(name).evict_before(cutoff),
            EvictionScope::WholeGame => game_entry.evict_all_before(cutoff),
        };
        if evicted > 0 {
            tracing::trace!(game = %game_entry.name(), series = %name, evicted, "Evicted stale samples");
        }

        let series = game_entry.series_mut(name);
        let stamp = series.last_timestamp().map_or(now, |last| last.max(now));
        let sample = Sample::new(stamp, value);
        series.push(sample);

        let event = NewSample {
            name: name.to_string(),
            time_value: sample,
        };
        for (id, subscriber) in game_entry.subscribers_of(name) {
            tracing::debug!(game = %game, series = %name, subscriber = %id, "Broadcasting sample");
            match subscriber.deliver(event.clone()) {
                Delivery::Delivered => {}
                Delivery::DisplacedOldest => {
                    tracing::warn!(
                        game = %game,
                        series = %name,
                        subscriber = %id,
                        "Subscriber buffer full, discarded oldest event"
                    );
                }
                Delivery::Dropped => {
                    tracing::warn!(
                        game = %game,
                        series = %name,
                        subscriber = %id,
                        "Delivery dropped"
                    );
                }
                Delivery::Cancelled => {
                    tracing::debug!(game = %game, series = %name, subscriber = %id, "Subscriber closing, skipped");
                }
            }
        }

        sample
    }

    // --- Subscriptions ---

    /// Subscribe to new samples of `(game, name)` under a fresh identity.
    ///
    /// The series need not exist yet.
    pub fn subscribe(&self, game: &str, name: &str) -> Subscription {
        let id = SubscriberId::Generated(self.next_subscriber.fetch_add(1, Ordering::SeqCst));
        self.subscribe_as(game, name, id)
    }

    /// Subscribe under a caller-chosen identity.
    ///
    /// If `id` is already registered for `(game, name)` the existing queue
    /// is reused rather than duplicated. Closing any handle for that
    /// identity ends all of them.
    pub fn subscribe_as(&self, game: &str, name: &str, id: SubscriberId) -> Subscription {
        let mut state = self.state.write();
        let game_entry = state.game_mut(game);

        let (receiver, cancellation) = match game_entry.subscriber(name, id) {
            Some(existing) => {
                tracing::info!(game = %game, series = %name, subscriber = %id, "Re-establishing subscription");
                (existing.receiver(), existing.cancellation())
            }
            None => {
                tracing::info!(game = %game, series = %name, subscriber = %id, "Adding subscription");
                let subscriber = Subscriber::new(self.config.delivery);
                let handles = (subscriber.receiver(), subscriber.cancellation());
                game_entry.add_subscriber(name, id, subscriber);
                handles
            }
        };

        Subscription::new(
            id,
            game.to_string(),
            name.to_string(),
            receiver,
            cancellation,
            Arc::downgrade(&self.state),
        )
    }

    /// Remove a subscriber. Returns whether anything was removed; removing
    /// an absent subscriber is a no-op.
    ///
    /// This waits for the store's lock, so under `Blocking` delivery it can
    /// stall behind a writer blocked on this very subscriber. Prefer
    /// [`Subscription::close`], which cancels that delivery first.
    pub fn unsubscribe(&self, game: &str, name: &str, id: SubscriberId) -> bool {
        self.state.write().remove_subscriber(game, name, id)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
