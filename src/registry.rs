// src/registry.rs

//! Subscriber registry and broadcast fan-out.
//!
//! The registry owns the set of live subscriber queues: it allocates
//! subscription identities, hands the matching receiver to the consumer,
//! and delivers every inbound message to every currently registered queue.
//!
//! Delivery is deliberately best-effort: a full subscriber queue drops that
//! message for that subscriber only, so slow or inattentive consumers never
//! stall the broadcaster or each other. No redelivery or backpressure
//! signal is given to the producer, and no gap markers are exposed.
//!
//! The registry is the sole owner of each registered sender. Removing an
//! entry (or shutting the registry down) drops the sender, which the
//! consumer observes as end-of-stream on its inbox.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::mpsc;

use crate::Message;

/// Capacity of each subscriber's output queue.
const SUBSCRIBER_QUEUE_CAPACITY: usize = 64;

/// Acquire a read guard, intentionally ignoring poisoning.
///
/// Poisoning indicates that another thread panicked while holding the lock.
/// The protected state is a plain id → sender map with no invariants
/// spanning multiple entries; the worst outcome of continuing is a dropped
/// message. This avoids propagating non-`Send` poison errors across async
/// boundaries.
fn read_ignore_poison<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    // ---
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Write-side counterpart of [`read_ignore_poison`].
fn write_ignore_poison<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    // ---
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Identity of one subscriber registration.
///
/// Identities are allocated monotonically and are unique for the lifetime
/// of the owning client; an identity is never reused, even after its
/// subscription is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Borrow the identity as a raw integer.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle returned from a successful subscription.
///
/// The subscription remains active until either:
/// - [`Client::unsubscribe`](crate::Client::unsubscribe) is called with `id`
/// - The client is closed
///
/// Either way the consumer observes end-of-stream on `inbox`. Dropping the
/// handle without unsubscribing leaves the registration in place; messages
/// fanned out to it are simply discarded once the inbox backs up.
pub struct SubscriptionHandle {
    // ---
    /// Identity needed to cancel this subscription.
    pub id: SubscriptionId,

    /// Receiver channel for messages delivered to this subscriber.
    pub inbox: mpsc::Receiver<Message>,
}

/// Registry of live subscriber queues.
///
/// Readers (the broadcaster's snapshot walk) share the lock; writers
/// (subscribe/unsubscribe/shutdown) are exclusive.
pub(crate) struct Registry {
    // ---
    listeners: RwLock<HashMap<u64, mpsc::Sender<Message>>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl Registry {
    pub(crate) fn new() -> Self {
        // ---
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Allocate a new identity and register its output queue.
    ///
    /// Once the registry has been shut down the identity is still
    /// allocated, but the queue is never registered: the returned handle is
    /// born at end-of-stream. Callers can treat both cases uniformly.
    pub(crate) fn subscribe(&self) -> SubscriptionHandle {
        // ---
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);

        {
            let mut listeners = write_ignore_poison(&self.listeners);
            if !self.closed.load(Ordering::Acquire) {
                listeners.insert(id.0, tx);
            }
            // closed: tx drops here and the handle starts terminated
        }

        SubscriptionHandle { id, inbox: rx }
    }

    /// Remove the registration for `id`, terminating its output queue.
    ///
    /// Removing an unknown or already-removed identity is a silent no-op.
    pub(crate) fn unsubscribe(&self, id: SubscriptionId) {
        // ---
        write_ignore_poison(&self.listeners).remove(&id.0);
    }

    /// Deliver `msg` to a snapshot of all currently registered queues.
    ///
    /// Non-blocking per queue: a full queue drops the message for that
    /// subscriber only.
    pub(crate) fn broadcast(&self, msg: &Message) {
        // ---
        let senders: Vec<mpsc::Sender<Message>> = {
            let listeners = read_ignore_poison(&self.listeners);
            listeners.values().cloned().collect()
        };

        for sender in senders {
            let _ = sender.try_send(msg.clone());
        }
    }

    /// Terminate every remaining registration and refuse new ones.
    ///
    /// Dropping the senders lets every consumer observe end-of-stream.
    pub(crate) fn close_all(&self) {
        // ---
        let mut listeners = write_ignore_poison(&self.listeners);
        self.closed.store(true, Ordering::Release);
        listeners.clear();
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        read_ignore_poison(&self.listeners).len()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn message(body: &str) -> Message {
        Message::new("general", "tester", body)
    }

    #[test]
    fn test_ids_monotonic_and_unique() {
        // ---
        let registry = Registry::new();

        let a = registry.subscribe();
        let b = registry.subscribe();
        registry.unsubscribe(a.id);
        let c = registry.subscribe();

        assert!(b.id.as_u64() > a.id.as_u64());
        // ids are never reused, even after unsubscribe
        assert!(c.id.as_u64() > b.id.as_u64());
    }

    #[tokio::test]
    async fn test_broadcast_preserves_arrival_order() {
        // ---
        let registry = Registry::new();
        let mut handle = registry.subscribe();

        registry.broadcast(&message("first"));
        registry.broadcast(&message("second"));

        assert_eq!(handle.inbox.recv().await.unwrap().body, "first");
        assert_eq!(handle.inbox.recv().await.unwrap().body, "second");
    }

    #[test]
    fn test_full_queue_drops_without_blocking() {
        // ---
        let registry = Registry::new();
        let mut full = registry.subscribe();
        let mut draining = registry.subscribe();

        for i in 0..SUBSCRIBER_QUEUE_CAPACITY + 10 {
            registry.broadcast(&message(&format!("m{i}")));
        }

        // The slow subscriber kept the first CAPACITY messages and lost the
        // rest; the other subscriber was unaffected only up to its own
        // capacity. Neither stalled the broadcast calls above.
        let mut received = 0;
        while full.inbox.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, SUBSCRIBER_QUEUE_CAPACITY);

        assert_eq!(draining.inbox.try_recv().unwrap().body, "m0");
    }

    #[test]
    fn test_unsubscribe_unknown_is_noop() {
        // ---
        let registry = Registry::new();
        let handle = registry.subscribe();

        registry.unsubscribe(handle.id);
        registry.unsubscribe(handle.id);
        registry.unsubscribe(SubscriptionId(9999));

        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_terminates_stream() {
        // ---
        let registry = Registry::new();
        let mut handle = registry.subscribe();

        registry.broadcast(&message("before"));
        registry.unsubscribe(handle.id);
        registry.broadcast(&message("after"));

        // Buffered message still drains, then end-of-stream.
        assert_eq!(handle.inbox.recv().await.unwrap().body, "before");
        assert!(handle.inbox.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_subscribe_after_close_is_terminated() {
        // ---
        let registry = Registry::new();
        registry.close_all();

        let mut handle = registry.subscribe();

        assert!(handle.inbox.recv().await.is_none());
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn test_close_all_terminates_every_stream() {
        // ---
        let registry = Registry::new();
        let mut a = registry.subscribe();
        let mut b = registry.subscribe();

        registry.close_all();

        assert!(a.inbox.recv().await.is_none());
        assert!(b.inbox.recv().await.is_none());
    }
}
