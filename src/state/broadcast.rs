//! Registry of connected viewers and snapshot fan-out.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::store::StoreGuard;

/// Identifier issued to a subscriber when it registers.
pub type SubscriberId = Uuid;

/// Serialized snapshot shared by every subscriber of one publish.
pub type SnapshotPayload = Arc<str>;

/// Why a snapshot could not be handed to a subscriber.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The subscriber's queue is full; it is not keeping up.
    #[error("subscriber queue is full")]
    Lagging,
    /// The receiving side was dropped (connection closed).
    #[error("subscriber disconnected")]
    Disconnected,
}

impl<T> From<TrySendError<T>> for DeliveryError {
    fn from(err: TrySendError<T>) -> Self {
        match err {
            TrySendError::Full(_) => DeliveryError::Lagging,
            TrySendError::Closed(_) => DeliveryError::Disconnected,
        }
    }
}

/// Outcome of one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// Fans snapshots out to every registered channel.
///
/// Delivery never waits: a subscriber that cannot take the snapshot right away
/// is removed and the remaining subscribers still receive it.
#[derive(Default)]
pub struct Broadcaster {
    subscribers: DashMap<SubscriberId, mpsc::Sender<SnapshotPayload>>,
}

impl Broadcaster {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `channel`. Nothing is pushed until the next publish.
    pub fn subscribe(&self, channel: mpsc::Sender<SnapshotPayload>) -> SubscriberId {
        let id = Uuid::new_v4();
        self.subscribers.insert(id, channel);
        id
    }

    /// Remove a subscriber; returns whether it was still registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    /// Whether `id` is currently registered.
    pub fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.subscribers.contains_key(&id)
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deregister every subscriber. Their channels close, so open streams end.
    pub fn close_all(&self) -> usize {
        let closed = self.subscribers.len();
        self.subscribers.clear();
        info!(closed, "all subscribers closed");
        closed
    }

    /// Serialize the state behind `guard` and deliver it to every subscriber.
    pub fn publish(&self, guard: &StoreGuard<'_>) -> PublishReport {
        match serde_json::to_string(&guard.state().snapshot()) {
            Ok(payload) => self.deliver(Arc::from(payload)),
            Err(err) => {
                warn!(error = %err, "failed to serialize snapshot; nothing published");
                PublishReport::default()
            }
        }
    }

    /// Hand `payload` to every subscriber, dropping the ones that fail.
    pub fn deliver(&self, payload: SnapshotPayload) -> PublishReport {
        // Work on a copy so failed entries can be removed without holding shard locks.
        let targets: Vec<(SubscriberId, mpsc::Sender<SnapshotPayload>)> = self
            .subscribers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut report = PublishReport::default();
        let mut failed = Vec::new();
        for (id, channel) in targets {
            match channel.try_send(payload.clone()) {
                Ok(()) => report.delivered += 1,
                Err(err) => failed.push((id, DeliveryError::from(err))),
            }
        }

        for (id, err) in failed {
            if self.subscribers.remove(&id).is_some() {
                report.dropped += 1;
                warn!(subscriber = %id, error = %err, "subscriber dropped after failed delivery");
            }
        }

        debug!(
            delivered = report.delivered,
            dropped = report.dropped,
            bytes = payload.len(),
            "snapshot published"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(text: &str) -> SnapshotPayload {
        Arc::from(text)
    }

    #[tokio::test]
    async fn close_all_ends_every_channel() {
        let hub = Broadcaster::new();
        let (first_tx, mut first_rx) = mpsc::channel(4);
        let (second_tx, mut second_rx) = mpsc::channel(4);
        hub.subscribe(first_tx);
        hub.subscribe(second_tx);

        assert_eq!(hub.close_all(), 2);

        assert_eq!(hub.subscriber_count(), 0);
        assert!(first_rx.recv().await.is_none());
        assert!(second_rx.recv().await.is_none());
        assert_eq!(hub.deliver(payload("late")), PublishReport::default());
    }

    #[tokio::test]
    async fn subscribe_does_not_push() {
        let hub = Broadcaster::new();
        let (tx, mut rx) = mpsc::channel(4);
        let id = hub.subscribe(tx);

        assert!(hub.is_subscribed(id));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn every_subscriber_gets_the_same_payload() {
        let hub = Broadcaster::new();
        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = mpsc::channel(4);
            hub.subscribe(tx);
            receivers.push(rx);
        }

        let report = hub.deliver(payload("{\"teams\":[]}"));
        assert_eq!(
            report,
            PublishReport {
                delivered: 3,
                dropped: 0
            }
        );

        let mut seen = Vec::new();
        for rx in receivers.iter_mut() {
            let received = rx.recv().await.unwrap();
            assert_eq!(&*received, "{\"teams\":[]}");
            seen.push(received);
            assert!(rx.try_recv().is_err());
        }
        assert!(seen.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }

    #[tokio::test]
    async fn closed_subscriber_is_removed_and_others_still_receive() {
        let hub = Broadcaster::new();
        let (dead_tx, dead_rx) = mpsc::channel(4);
        let dead = hub.subscribe(dead_tx);
        drop(dead_rx);
        let (live_tx, mut live_rx) = mpsc::channel(4);
        let live = hub.subscribe(live_tx);

        let report = hub.deliver(payload("one"));
        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, 1);
        assert!(!hub.is_subscribed(dead));
        assert!(hub.is_subscribed(live));
        assert_eq!(&*live_rx.recv().await.unwrap(), "one");

        let report = hub.deliver(payload("two"));
        assert_eq!(
            report,
            PublishReport {
                delivered: 1,
                dropped: 0
            }
        );
    }

    #[tokio::test]
    async fn lagging_subscriber_is_dropped_and_its_stream_ends() {
        let hub = Broadcaster::new();
        let (tx, mut rx) = mpsc::channel(1);
        let id = hub.subscribe(tx);

        assert_eq!(hub.deliver(payload("first")).delivered, 1);
        let report = hub.deliver(payload("second"));
        assert_eq!(report.dropped, 1);
        assert!(!hub.is_subscribed(id));

        assert_eq!(&*rx.recv().await.unwrap(), "first");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn publishes_arrive_in_order() {
        let hub = Broadcaster::new();
        let (tx, mut rx) = mpsc::channel(8);
        hub.subscribe(tx);

        hub.deliver(payload("a"));
        hub.deliver(payload("b"));

        assert_eq!(&*rx.recv().await.unwrap(), "a");
        assert_eq!(&*rx.recv().await.unwrap(), "b");
    }

    #[test]
    fn unsubscribe_reports_presence() {
        let hub = Broadcaster::new();
        let (tx, _rx) = mpsc::channel(1);
        let id = hub.subscribe(tx);
        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn delivery_error_maps_send_failures() {
        assert_eq!(
            DeliveryError::from(TrySendError::Full(())),
            DeliveryError::Lagging
        );
        assert_eq!(
            DeliveryError::from(TrySendError::Closed(())),
            DeliveryError::Disconnected
        );
    }
}
