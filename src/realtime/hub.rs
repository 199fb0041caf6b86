//! Per-subscriber fan-out
//!
//! Every connected client gets its own bounded queue. Publishing never
//! waits on a subscriber: an event is wrapped in an `Arc` once and each
//! queue receives a pointer to the same allocation. A queue whose receiver
//! is gone, or that is full because its client stopped draining it, is
//! dropped on the publish that finds it so, without affecting the others.
//! Dropping the sender closes the client's receiver, which ends its session.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::events::OutboundEvent;

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// Events a client may fall behind by before it is disconnected.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Process-unique identity of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(u64);

impl ClientId {
    pub fn next() -> Self {
        ClientId(NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

pub type EventReceiver = mpsc::Receiver<Arc<OutboundEvent>>;
type EventSender = mpsc::Sender<Arc<OutboundEvent>>;

#[derive(Debug)]
pub struct Hub {
    subscribers: Mutex<HashMap<ClientId, EventSender>>,
    capacity: usize,
}

impl Default for Hub {
    fn default() -> Self {
        Hub::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// `capacity` is clamped to at least one slot.
    pub fn with_capacity(capacity: usize) -> Self {
        Hub {
            subscribers: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    // Critical sections only insert/remove whole entries, so a poisoned map
    // is still consistent.
    fn subscribers(&self) -> MutexGuard<'_, HashMap<ClientId, EventSender>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a client and hand back the receiving half of its queue.
    pub fn register(&self, id: ClientId) -> EventReceiver {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers().insert(id, tx);
        tracing::debug!(client = %id, "subscriber registered");
        rx
    }

    pub fn remove(&self, id: ClientId) -> bool {
        let removed = self.subscribers().remove(&id).is_some();
        if removed {
            tracing::debug!(client = %id, "subscriber removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.subscribers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Publish to every subscriber. Returns how many queues accepted it.
    pub fn broadcast(&self, event: OutboundEvent) -> usize {
        let event = Arc::new(event);
        let mut subscribers = self.subscribers();

        subscribers.retain(|id, tx| match tx.try_send(Arc::clone(&event)) {
            Ok(()) => true,
            Err(err) => {
                log_dropped(*id, &event, &err);
                false
            }
        });

        subscribers.len()
    }

    /// Publish to a single subscriber. Returns false if it is not connected.
    pub fn send_to(&self, id: ClientId, event: OutboundEvent) -> bool {
        let mut subscribers = self.subscribers();

        let Some(tx) = subscribers.get(&id) else {
            return false;
        };

        let event = Arc::new(event);
        if let Err(err) = tx.try_send(Arc::clone(&event)) {
            subscribers.remove(&id);
            log_dropped(id, &event, &err);
            return false;
        }

        true
    }
}

fn log_dropped<T>(id: ClientId, event: &OutboundEvent, err: &TrySendError<T>) {
    match err {
        TrySendError::Full(_) => {
            tracing::warn!(client = %id, event = event.name(), "subscriber queue full, dropping")
        }
        TrySendError::Closed(_) => {
            tracing::warn!(client = %id, event = event.name(), "subscriber gone, dropping")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ids_are_unique() {
        let a = ClientId::next();
        let b = ClientId::next();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_subscriber() {
        let hub = Hub::new();
        let mut a = hub.register(ClientId::next());
        let mut b = hub.register(ClientId::next());

        let delivered = hub.broadcast(OutboundEvent::PatientDischarged {
            patient_id: "P-1001".to_string(),
        });

        assert_eq!(delivered, 2);
        let from_a = a.recv().await.unwrap();
        let from_b = b.recv().await.unwrap();
        assert!(Arc::ptr_eq(&from_a, &from_b));
    }

    #[tokio::test]
    async fn test_dead_subscriber_does_not_block_others() {
        let hub = Hub::new();
        let dead = hub.register(ClientId::next());
        let mut live = hub.register(ClientId::next());
        drop(dead);

        let delivered = hub.broadcast(OutboundEvent::EcgRecordingComplete(vec![1]));

        assert_eq!(delivered, 1);
        assert_eq!(hub.len(), 1);
        assert!(live.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_stalled_subscriber_is_dropped_without_blocking_others() {
        let hub = Hub::with_capacity(2);
        let stalled = ClientId::next();
        let mut stalled_rx = hub.register(stalled);
        let mut live = hub.register(ClientId::next());

        for sample in 0..3 {
            hub.broadcast(OutboundEvent::EcgRecordingComplete(vec![sample]));
            let event = live.recv().await.unwrap();
            assert_eq!(*event, OutboundEvent::EcgRecordingComplete(vec![sample]));
        }

        assert_eq!(hub.len(), 1);
        assert!(!hub.send_to(stalled, OutboundEvent::EcgRecordingComplete(vec![9])));

        // What was queued before the overflow still drains, then the queue closes
        assert!(stalled_rx.recv().await.is_some());
        assert!(stalled_rx.recv().await.is_some());
        assert!(stalled_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_send_to_full_queue_drops_subscriber() {
        let hub = Hub::with_capacity(1);
        let owner = ClientId::next();
        let _owner_rx = hub.register(owner);

        assert!(hub.send_to(owner, OutboundEvent::EcgRecordingComplete(vec![1])));
        assert!(!hub.send_to(owner, OutboundEvent::EcgRecordingComplete(vec![2])));
        assert!(hub.is_empty());
    }

    #[tokio::test]
    async fn test_send_to_addresses_one_subscriber() {
        let hub = Hub::new();
        let owner = ClientId::next();
        let mut owner_rx = hub.register(owner);
        let mut other_rx = hub.register(ClientId::next());

        assert!(hub.send_to(owner, OutboundEvent::EcgRecordingComplete(vec![7, 8])));

        let event = owner_rx.recv().await.unwrap();
        assert_eq!(*event, OutboundEvent::EcgRecordingComplete(vec![7, 8]));
        assert!(other_rx.try_recv().is_err());
    }

    #[test]
    fn test_send_to_unknown_client() {
        let hub = Hub::new();
        assert!(!hub.send_to(ClientId::next(), OutboundEvent::EcgRecordingComplete(vec![])));
    }
}
