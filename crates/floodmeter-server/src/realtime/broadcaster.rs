use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use floodmeter_core::error::Result;
use floodmeter_core::protocol::feed::RequestsEvent;

use crate::obs::metrics::ServerMetrics;

/// Identity of one feed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Outcome of one publish call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    /// Subscribers whose queue was full; they miss this tick.
    pub dropped: usize,
    /// Subscribers whose session already ended; pruned from the set.
    pub pruned: usize,
}

/// Subscriber set with lossy fan-out.
///
/// Each subscriber owns a bounded queue drained by its session task. `publish`
/// encodes once, snapshots the set, then `try_send`s to every queue, so a slow
/// subscriber can neither block the sampler nor another subscriber.
pub struct Broadcaster {
    subscribers: DashMap<SubscriberId, mpsc::Sender<Message>>,
    seq: AtomicU64,
    metrics: Arc<ServerMetrics>,
}

impl Broadcaster {
    pub fn new(metrics: Arc<ServerMetrics>) -> Self {
        Self {
            subscribers: DashMap::new(),
            seq: AtomicU64::new(1),
            metrics,
        }
    }

    /// Register a queue. It receives every tick published from now on.
    pub fn subscribe(&self, tx: mpsc::Sender<Message>) -> SubscriberId {
        let id = SubscriberId(self.seq.fetch_add(1, Ordering::Relaxed));
        self.subscribers.insert(id, tx);
        self.metrics.feed_subscribers.inc(&[]);
        id
    }

    /// Remove a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.remove(&id).is_some();
        if removed {
            self.metrics.feed_subscribers.dec(&[]);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Fire-and-forget delivery of one tick to every current subscriber.
    pub fn publish(&self, event: &RequestsEvent) -> Result<PublishReport> {
        let text = event.to_text()?;

        let targets: Vec<(SubscriberId, mpsc::Sender<Message>)> = self
            .subscribers
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();

        let mut report = PublishReport::default();
        for (id, tx) in targets {
            match tx.try_send(Message::Text(text.clone())) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    report.dropped += 1;
                    self.metrics.broadcast_drops.inc(&[]);
                }
                Err(TrySendError::Closed(_)) => {
                    if self.unsubscribe(id) {
                        report.pruned += 1;
                    }
                }
            }
        }
        Ok(report)
    }

    /// Drop every queue; each session sees its channel close and ends.
    pub fn close_all(&self) -> usize {
        let ids: Vec<SubscriberId> = self.subscribers.iter().map(|r| *r.key()).collect();
        ids.into_iter().filter(|id| self.unsubscribe(*id)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(msg: Message) -> String {
        match msg {
            Message::Text(s) => s,
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let b = Broadcaster::new(Arc::new(ServerMetrics::default()));
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        b.subscribe(tx1);
        b.subscribe(tx2);

        let report = b.publish(&RequestsEvent::new(5, 5, 5)).unwrap();
        assert_eq!(report.delivered, 2);

        for rx in [&mut rx1, &mut rx2] {
            let ev = RequestsEvent::from_text(&text_of(rx.recv().await.unwrap())).unwrap();
            assert_eq!(ev, RequestsEvent::new(5, 5, 5));
        }
    }

    #[tokio::test]
    async fn late_subscriber_gets_no_backfill() {
        let b = Broadcaster::new(Arc::new(ServerMetrics::default()));
        b.publish(&RequestsEvent::new(1, 1, 1)).unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        b.subscribe(tx);
        b.publish(&RequestsEvent::new(2, 1, 1)).unwrap();

        let ev = RequestsEvent::from_text(&text_of(rx.recv().await.unwrap())).unwrap();
        assert_eq!(ev.cumulative, 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_queue_drops_tick_and_keeps_order() {
        let metrics = Arc::new(ServerMetrics::default());
        let b = Broadcaster::new(Arc::clone(&metrics));
        let (tx, mut rx) = mpsc::channel(1);
        b.subscribe(tx);

        b.publish(&RequestsEvent::new(1, 1, 1)).unwrap();
        let report = b.publish(&RequestsEvent::new(2, 1, 1)).unwrap();
        assert_eq!(report.dropped, 1);
        assert_eq!(metrics.broadcast_drops.get(&[]), 1);

        let first = RequestsEvent::from_text(&text_of(rx.recv().await.unwrap())).unwrap();
        assert_eq!(first.cumulative, 1);

        b.publish(&RequestsEvent::new(3, 1, 1)).unwrap();
        let next = RequestsEvent::from_text(&text_of(rx.recv().await.unwrap())).unwrap();
        assert_eq!(next.cumulative, 3);
    }

    #[tokio::test]
    async fn closed_subscriber_is_pruned() {
        let metrics = Arc::new(ServerMetrics::default());
        let b = Broadcaster::new(Arc::clone(&metrics));
        let (tx, rx) = mpsc::channel(1);
        b.subscribe(tx);
        drop(rx);

        let report = b.publish(&RequestsEvent::default()).unwrap();
        assert_eq!(report.pruned, 1);
        assert!(b.is_empty());
        assert_eq!(metrics.feed_subscribers.get(&[]), 0);
    }

    #[tokio::test]
    async fn close_all_ends_sessions() {
        let b = Broadcaster::new(Arc::new(ServerMetrics::default()));
        let (tx, mut rx) = mpsc::channel(1);
        let id = b.subscribe(tx);
        assert_eq!(b.close_all(), 1);
        assert!(rx.recv().await.is_none());
        assert!(!b.unsubscribe(id));
    }
}
