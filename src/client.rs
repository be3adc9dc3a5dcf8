// src/client.rs

//! Chat client implementation.
//!
//! This module contains the core [`Client`] type which owns the transport
//! handle, runs the broadcast worker, and exposes the public
//! connect/send/subscribe/unsubscribe/close surface.
//!
//! # Architecture
//!
//! Construction spawns a single background worker that drains the internal
//! inbound queue and fans each message out to every registered subscriber.
//! The transport pushes inbound messages into that queue once
//! `connect()` has registered it. Outbound sends run on the caller's task,
//! wrapped in the configured retry policy.
//!
//! # Concurrency
//!
//! Every operation may be invoked concurrently from many callers; the
//! client is cheap to clone and all clones share one engine instance. The
//! only mutable shared state is the closed flag (atomic) and the
//! subscriber map (reader/writer lock, owned by the registry). Shutdown is
//! serialized through a mutex so exactly one physical shutdown sequence
//! runs no matter how many callers race `close()`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::chat_config::DEFAULT_DIAL_TIMEOUT;
use crate::registry::Registry;
use crate::{
    // ---
    ChatConfig,
    Error,
    Message,
    Result,
    SubscriptionHandle,
    SubscriptionId,
    TransportPtr,
};

/// Sender identity stamped on every outbound message.
const LOCAL_SENDER: &str = "sdk-client";

/// Capacity of the inbound queue between the transport and the worker.
const INBOUND_QUEUE_CAPACITY: usize = 128;

/// Running chat client instance.
///
/// Cheap to clone (internally `Arc`-backed).
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    // ---
    config: ChatConfig,
    transport: TransportPtr,
    registry: Arc<Registry>,

    /// Set before anything else during `close()`; checked by every
    /// operation so new work is rejected the moment shutdown begins.
    closed: AtomicBool,

    /// Taken exactly once by the first `close()` to run the shutdown
    /// sequence; later (and concurrent) closers find `None` and return
    /// after the sequence has finished.
    shutdown: Mutex<Option<Shutdown>>,
}

/// Resources released during the one physical shutdown.
struct Shutdown {
    // ---
    /// The engine's own clone of the inbound sender. Dropping it (after
    /// the transport has dropped its clone) closes the inbound queue.
    inbound_tx: mpsc::Sender<Message>,

    /// Broadcast worker handle, joined before subscriber queues are
    /// terminated so no message is delivered to a terminated queue.
    worker: JoinHandle<()>,
}

impl Client {
    // ---
    /// Create a client over an explicitly provided transport.
    ///
    /// Validates the required configuration, applies defaults for unset
    /// optional fields, and starts the broadcast worker immediately; the
    /// worker runs for the client's whole life, independent of transport
    /// connect/close.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `api_key` or `endpoint` is empty. No
    /// partially constructed client is ever produced.
    pub fn new(config: ChatConfig, transport: TransportPtr) -> Result<Self> {
        // ---
        config.validate()?;

        let mut config = config;
        if config.dial_timeout.is_zero() {
            config.dial_timeout = DEFAULT_DIAL_TIMEOUT;
        }

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_CAPACITY);
        let registry = Arc::new(Registry::new());

        let worker = tokio::spawn(broadcast_loop(inbound_rx, registry.clone()));

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                transport,
                registry,
                closed: AtomicBool::new(false),
                shutdown: Mutex::new(Some(Shutdown { inbound_tx, worker })),
            }),
        })
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Establish the backend session and register the inbound queue.
    ///
    /// The transport connect is bounded by the configured dial timeout;
    /// a caller-supplied `deadline` can only tighten that bound, never
    /// extend it. Pass `None` to use the configured timeout as-is.
    ///
    /// # Errors
    ///
    /// - `Error::Closed` if the client has been closed
    /// - `Error::Connection` if the transport fails to connect or to
    ///   register the inbound subscription; the client's state is
    ///   unchanged and a later `connect()` may succeed
    pub async fn connect(&self, deadline: Option<Duration>) -> Result<()> {
        // ---
        if self.is_closed() {
            return Err(Error::Closed);
        }

        let dial_timeout = self.inner.config.dial_timeout;
        let deadline = deadline.map_or(dial_timeout, |d| d.min(dial_timeout));

        time::timeout(deadline, self.inner.transport.connect(deadline))
            .await
            .map_err(|_| Error::Connection(format!("connect: timed out after {deadline:?}")))?
            .map_err(|err| Error::Connection(format!("connect: {err}")))?;

        // Clone the inbound sender out of the shutdown slot. A concurrent
        // close() holds this lock for its whole sequence, so by the time we
        // observe None the client is definitively closed.
        let inbound_tx = {
            let guard = self.inner.shutdown.lock().await;
            match guard.as_ref() {
                Some(shutdown) => shutdown.inbound_tx.clone(),
                None => return Err(Error::Closed),
            }
        };

        self.inner
            .transport
            .subscribe_inbound(inbound_tx)
            .await
            .map_err(|err| Error::Connection(format!("subscribe: {err}")))?;

        crate::log_debug!("connected to {}", self.inner.config.endpoint);
        Ok(())
    }

    /// Send `body` on the named channel.
    ///
    /// The message is stamped with the current UTC instant and the local
    /// sender identity, then handed to the transport through the
    /// configured retry policy. The whole operation, waits between retries
    /// included, aborts as soon as `cancel` fires.
    ///
    /// # Errors
    ///
    /// - `Error::Closed` if the client has been closed
    /// - `Error::Transport` if every attempt the policy allows failed
    /// - `Error::Cancelled` if `cancel` fired first
    pub async fn send(&self, channel: &str, body: &str, cancel: &CancellationToken) -> Result<()> {
        // ---
        if self.is_closed() {
            return Err(Error::Closed);
        }

        let msg = Message::new(channel, LOCAL_SENDER, body);
        let transport = &self.inner.transport;

        self.inner
            .config
            .retry
            .execute(cancel, || {
                let msg = msg.clone();
                async move { transport.send(msg).await }
            })
            .await
    }

    /// Register a new subscriber and return its handle.
    ///
    /// Every subscriber receives a live copy of each inbound message,
    /// subject to the best-effort delivery policy: a subscriber whose
    /// inbox is full loses that message without affecting the others.
    ///
    /// Subscribing on a closed client does not fail; it returns a handle
    /// whose inbox is already at end-of-stream.
    pub fn subscribe(&self) -> SubscriptionHandle {
        self.inner.registry.subscribe()
    }

    /// Cancel the subscription with the given identity.
    ///
    /// The consumer observes end-of-stream on its inbox once buffered
    /// messages are drained. Unknown identities are silently ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.registry.unsubscribe(id)
    }

    /// Shut the client down.
    ///
    /// Idempotent and safe to call from any state, any number of times,
    /// concurrently. Exactly one physical shutdown sequence executes:
    ///
    /// 1. the closed flag flips, so new operations are rejected
    /// 2. the transport is closed and stops producing inbound messages
    /// 3. the inbound queue closes; the worker drains what is buffered
    /// 4. the worker is joined, so it cannot outlive this call
    /// 5. every remaining subscriber queue is terminated
    ///
    /// Concurrent callers block until the sequence finishes; all callers
    /// return `Ok(())`.
    pub async fn close(&self) -> Result<()> {
        // ---
        self.inner.closed.store(true, Ordering::SeqCst);

        // Holding the lock for the whole sequence makes later callers wait
        // for the first one to finish rather than returning early.
        let mut guard = self.inner.shutdown.lock().await;
        let Some(shutdown) = guard.take() else {
            return Ok(());
        };

        // Stop inbound production; the transport drops its inbound sender
        // before this returns.
        let _ = self.inner.transport.close().await;

        // Last sender gone: the worker drains buffered messages and exits.
        drop(shutdown.inbound_tx);

        if shutdown.worker.await.is_err() {
            crate::log_warn!("broadcast worker panicked during shutdown");
        }

        self.inner.registry.close_all();

        crate::log_debug!("client closed");
        Ok(())
    }
}

/// Drain the inbound queue, fanning each message out to all subscribers.
///
/// Exits when the queue closes, i.e. when the transport and the shutdown
/// sequence have both dropped their senders.
async fn broadcast_loop(mut inbound: mpsc::Receiver<Message>, registry: Arc<Registry>) {
    // ---
    while let Some(msg) = inbound.recv().await {
        registry.broadcast(&msg);
    }
    crate::log_debug!("inbound queue closed, broadcast worker exiting");
}
