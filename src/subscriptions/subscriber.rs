//! Registry entry for one subscriber and its delivery behaviour.

use crate::types::NewSample;
use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::types::DeliveryPolicy;

/// Outcome of handing one event to one subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Delivery {
    Delivered,
    /// Delivered, but an older queued event was discarded to make room.
    DisplacedOldest,
    /// Not delivered.
    Dropped,
    /// Not delivered: the subscriber is closing.
    Cancelled,
}

/// Close signal shared by a subscriber and its handles.
///
/// The flag is sticky; the wake channel interrupts a delivery that is
/// already waiting on the hand-off.
pub(crate) struct Cancellation {
    closed: AtomicBool,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl Cancellation {
    fn new() -> Self {
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            closed: AtomicBool::new(false),
            wake_tx,
            wake_rx,
        }
    }

    /// Stop all current and future deliveries.
    pub(crate) fn cancel(&self) {
        // Flag first: a delivery that missed it is woken by the token.
        self.closed.store(true, Ordering::SeqCst);
        let _ = self.wake_tx.try_send(());
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Producer side of a subscription, kept in the game's registry.
///
/// The registry also keeps a receiver so that re-establishing the same
/// subscriber hands back the same queue, and so `Buffered` can pop the
/// oldest event when full.
pub(crate) struct Subscriber {
    sender: Sender<NewSample>,
    receiver: Receiver<NewSample>,
    policy: DeliveryPolicy,
    cancellation: Arc<Cancellation>,
}

impl Subscriber {
    pub(crate) fn new(policy: DeliveryPolicy) -> Self {
        let capacity = match policy {
            DeliveryPolicy::Blocking | DeliveryPolicy::Timeout(_) => 0,
            DeliveryPolicy::Buffered { capacity } => capacity.max(1),
        };
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            policy,
            cancellation: Arc::new(Cancellation::new()),
        }
    }

    /// A new consumer handle onto this subscriber's queue.
    pub(crate) fn receiver(&self) -> Receiver<NewSample> {
        self.receiver.clone()
    }

    pub(crate) fn cancellation(&self) -> Arc<Cancellation> {
        Arc::clone(&self.cancellation)
    }

    /// Hand `event` over according to the policy.
    ///
    /// `Blocking` does not return until a consumer takes the event or the
    /// subscriber is cancelled.
    pub(crate) fn deliver(&self, event: NewSample) -> Delivery {
        if self.cancellation.is_cancelled() {
            return Delivery::Cancelled;
        }
        let cancel = &self.cancellation.wake_rx;

        match self.policy {
            DeliveryPolicy::Blocking => select! {
                send(self.sender, event) -> res => match res {
                    Ok(()) => Delivery::Delivered,
                    Err(_) => Delivery::Dropped,
                },
                recv(cancel) -> _ => Delivery::Cancelled,
            },
            DeliveryPolicy::Timeout(wait) => select! {
                send(self.sender, event) -> res => match res {
                    Ok(()) => Delivery::Delivered,
                    Err(_) => Delivery::Dropped,
                },
                recv(cancel) -> _ => Delivery::Cancelled,
                default(wait) => Delivery::Dropped,
            },
            DeliveryPolicy::Buffered { .. } => {
                let mut pending = event;
                let mut displaced = false;
                loop {
                    match self.sender.try_send(pending) {
                        Ok(()) if displaced => return Delivery::DisplacedOldest,
                        Ok(()) => return Delivery::Delivered,
                        Err(TrySendError::Full(back)) => {
                            // A consumer may have emptied a slot meanwhile;
                            // either way the retry finds room.
                            let _ = self.receiver.try_recv();
                            displaced = true;
                            pending = back;
                        }
                        Err(TrySendError::Disconnected(_)) => return Delivery::Dropped,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Sample, Timestamp};
    use std::thread;
    use std::time::{Duration, Instant};

    fn event(value: i32) -> NewSample {
        NewSample {
            name: "x".to_string(),
            time_value: Sample::new(Timestamp(value as i64), value),
        }
    }

    #[test]
    fn test_blocking_waits_for_receiver() {
        let subscriber = Subscriber::new(DeliveryPolicy::Blocking);
        let receiver = subscriber.receiver();

        let consumer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            receiver.recv().unwrap()
        });

        let started = Instant::now();
        assert_eq!(subscriber.deliver(event(1)), Delivery::Delivered);
        assert!(started.elapsed() >= Duration::from_millis(40));
        assert_eq!(consumer.join().unwrap().time_value.value(), 1);
    }

    #[test]
    fn test_cancel_interrupts_blocked_delivery() {
        let subscriber = Subscriber::new(DeliveryPolicy::Blocking);
        let cancellation = subscriber.cancellation();

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            cancellation.cancel();
        });

        assert_eq!(subscriber.deliver(event(1)), Delivery::Cancelled);
        canceller.join().unwrap();

        // Sticky: later deliveries return at once.
        assert_eq!(subscriber.deliver(event(2)), Delivery::Cancelled);
        assert_eq!(subscriber.deliver(event(3)), Delivery::Cancelled);
    }

    #[test]
    fn test_buffered_drops_oldest() {
        let subscriber = Subscriber::new(DeliveryPolicy::Buffered { capacity: 2 });
        let receiver = subscriber.receiver();

        assert_eq!(subscriber.deliver(event(1)), Delivery::Delivered);
        assert_eq!(subscriber.deliver(event(2)), Delivery::Delivered);
        assert_eq!(subscriber.deliver(event(3)), Delivery::DisplacedOldest);

        let values: Vec<i32> = receiver.try_iter().map(|e| e.time_value.value()).collect();
        assert_eq!(values, vec![2, 3]);
    }

    #[test]
    fn test_buffered_zero_capacity_still_holds_one() {
        let subscriber = Subscriber::new(DeliveryPolicy::Buffered { capacity: 0 });
        assert_eq!(subscriber.deliver(event(1)), Delivery::Delivered);
        assert_eq!(subscriber.receiver().try_recv().unwrap().time_value.value(), 1);
    }

    #[test]
    fn test_timeout_gives_up() {
        let subscriber = Subscriber::new(DeliveryPolicy::Timeout(Duration::from_millis(20)));
        let started = Instant::now();
        assert_eq!(subscriber.deliver(event(1)), Delivery::Dropped);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
