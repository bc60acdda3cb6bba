//! Subscription types for live series updates.

use crate::error::{Result, StoreError};
use crate::store::StoreState;
use crate::types::NewSample;
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use super::subscriber::Cancellation;

/// What a delivery does when the subscriber is not ready.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DeliveryPolicy {
    /// Rendezvous hand-off. The writer waits until the subscriber receives.
    #[default]
    Blocking,

    /// Queue up to `capacity` events (at least one); discard the oldest when full.
    Buffered { capacity: usize },

    /// Rendezvous hand-off that gives up after the duration and skips the event.
    Timeout(Duration),
}

/// Identity of one subscriber within a `(game, series)` pair.
///
/// `Generated` ids come only from `Store::subscribe`, so a `Chosen` id
/// passed to `Store::subscribe_as` can never join a generated subscriber.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubscriberId {
    /// Assigned by the store.
    Generated(u64),
    /// Picked by the caller, e.g. a transport's connection id.
    Chosen(u64),
}

impl fmt::Debug for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriberId::Generated(n) => write!(f, "SubscriberId(gen {})", n),
            SubscriberId::Chosen(n) => write!(f, "SubscriberId({})", n),
        }
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriberId::Generated(n) => write!(f, "gen-{}", n),
            SubscriberId::Chosen(n) => write!(f, "{}", n),
        }
    }
}

/// Consumer handle for one subscription.
///
/// Events arrive in append order. The handle is single-use: once closed it
/// cannot be reopened, only replaced by a fresh `subscribe`. Dropping it
/// closes it.
pub struct Subscription {
    id: SubscriberId,
    game: String,
    series: String,
    receiver: Receiver<NewSample>,
    cancellation: Arc<Cancellation>,
    state: Weak<RwLock<StoreState>>,
    closed: bool,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriberId,
        game: String,
        series: String,
        receiver: Receiver<NewSample>,
        cancellation: Arc<Cancellation>,
        state: Weak<RwLock<StoreState>>,
    ) -> Self {
        Self {
            id,
            game,
            series,
            receiver,
            cancellation,
            state,
            closed: false,
        }
    }

    /// Identity to pass to `Store::unsubscribe` or `Store::subscribe_as`.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Game this subscription listens to.
    pub fn game(&self) -> &str {
        &self.game
    }

    /// Series this subscription listens to.
    pub fn series(&self) -> &str {
        &self.series
    }

    /// Whether `close` has run on this handle.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Receive the next event (blocking).
    ///
    /// Fails with `Disconnected` once the registry entry is gone, whether
    /// through `Store::unsubscribe` or because the store was dropped.
    pub fn recv(&self) -> Result<NewSample> {
        self.ensure_open()?;
        self.receiver.recv().map_err(|_| StoreError::Disconnected)
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<Option<NewSample>> {
        self.ensure_open()?;
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(StoreError::Disconnected),
        }
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<NewSample> {
        self.ensure_open()?;
        self.receiver.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => StoreError::Timeout,
            RecvTimeoutError::Disconnected => StoreError::Disconnected,
        })
    }

    /// Lazy blocking iterator over events. Ends when the subscription is
    /// removed from the store; yields nothing if already closed.
    pub fn iter(&self) -> impl Iterator<Item = NewSample> + '_ {
        let live = if self.closed { None } else { Some(self.receiver.iter()) };
        live.into_iter().flatten()
    }

    /// Unregister from the store. Idempotent.
    ///
    /// Deliveries to this subscriber are cancelled first, so a writer
    /// blocked handing it an event gives up and releases the store's lock.
    /// The event in flight at that moment is lost.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cancellation.cancel();

        if let Some(state) = self.state.upgrade() {
            state
                .write()
                .remove_subscriber(&self.game, &self.series, self.id);
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(StoreError::SubscriptionClosed)
        } else {
            Ok(())
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("game", &self.game)
            .field("series", &self.series)
            .field("closed", &self.closed)
            .finish()
    }
}
