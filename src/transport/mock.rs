// src/transport/mock.rs

//! In-process mock transport.
//!
//! This file contains the concrete implementation of the domain-level
//! `Transport` trait using in-process data structures only.
//!
//! The mock transport is the **reference implementation** of transport
//! semantics. Other transports are expected to approximate this behavior
//! as closely as their underlying systems allow and to document any
//! unavoidable deviations.
//!
//! ## Semantics
//!
//! - `connect()` is idempotent and starts the backend pump.
//! - Messages sent while connected are echoed back on the inbound path
//!   with the sender identity re-stamped to the backend's identity.
//! - Delivery toward the inbound destination is non-blocking; a full
//!   destination drops that message.
//! - After `close()` returns, no further inbound messages are produced and
//!   the inbound destination sender has been dropped.
//!
//! ## Non-Goals
//!
//! - Persistence or durability
//! - Network behavior or failure simulation
//! - Exact emulation of any real backend protocol

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::{ChatConfig, Error, Message, Result, Transport, TransportPtr};

/// Identity the mock backend stamps on messages it delivers.
const REMOTE_SENDER: &str = "remote-user";

/// Capacity of the mock backend's internal queues.
const BACKEND_QUEUE_CAPACITY: usize = 256;

/// In-process mock transport.
///
/// Simulates a realtime backend entirely within the process: every message
/// sent is looped back as an inbound message from `"remote-user"`. Intended
/// for testing and for validating client behavior without network or
/// timing variability.
struct MockTransport {
    // ---
    state: Mutex<State>,
}

struct State {
    // ---
    running: bool,

    /// Send side of the backend ingress queue; dropped on close so the
    /// pump drains and exits.
    in_tx: Option<mpsc::Sender<Message>>,

    /// Receive side of the ingress queue, consumed by the pump at connect.
    in_rx: Option<mpsc::Receiver<Message>>,

    /// Send side of the egress queue, handed to the pump at connect.
    out_tx: Option<mpsc::Sender<Message>>,

    /// Receive side of the egress queue, consumed by the forwarder when
    /// the client registers its inbound destination.
    out_rx: Option<mpsc::Receiver<Message>>,

    /// Pump and forwarder handles, joined during close.
    tasks: Vec<JoinHandle<()>>,
}

/// Backend loop: re-stamp the sender identity and move ingress to egress.
///
/// Dropping `out_tx` at exit is what terminates the forwarder.
async fn pump(mut in_rx: mpsc::Receiver<Message>, out_tx: mpsc::Sender<Message>) {
    // ---
    while let Some(mut msg) = in_rx.recv().await {
        msg.from = REMOTE_SENDER.to_owned();
        // lossy when the egress queue is full, never blocking
        let _ = out_tx.try_send(msg);
    }
}

/// Delivery loop: move egress messages into the registered destination.
async fn forward(mut out_rx: mpsc::Receiver<Message>, dst: mpsc::Sender<Message>) {
    // ---
    while let Some(msg) = out_rx.recv().await {
        let _ = dst.try_send(msg);
    }
    crate::log_debug!("mock transport inbound forwarder exiting");
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    // ---

    /// Start the backend pump. Repeat calls while connected are no-ops.
    ///
    /// The mock connects instantly, so the deadline is never consulted.
    async fn connect(&self, _deadline: std::time::Duration) -> Result<()> {
        // ---
        let mut state = self.state.lock().await;
        if state.running {
            return Ok(());
        }

        let (Some(in_rx), Some(out_tx)) = (state.in_rx.take(), state.out_tx.take()) else {
            return Err(Error::Transport("transport closed".into()));
        };

        state.running = true;
        state.tasks.push(tokio::spawn(pump(in_rx, out_tx)));
        Ok(())
    }

    /// Enqueue one message into the backend.
    ///
    /// Waits for ingress capacity; abandoning the returned future cancels
    /// the send without side effects.
    async fn send(&self, msg: Message) -> Result<()> {
        // ---
        let in_tx = {
            let state = self.state.lock().await;
            if !state.running {
                return Err(Error::Transport("not connected".into()));
            }
            state.in_tx.clone()
        };

        match in_tx {
            Some(in_tx) => in_tx
                .send(msg)
                .await
                .map_err(|_| Error::Transport("backend queue closed".into())),
            None => Err(Error::Transport("not connected".into())),
        }
    }

    /// Register the destination for inbound messages.
    ///
    /// The mock supports a single registration per connection; the client
    /// registers exactly one inbound queue.
    async fn subscribe_inbound(&self, dst: mpsc::Sender<Message>) -> Result<()> {
        // ---
        let mut state = self.state.lock().await;
        if !state.running {
            return Err(Error::Transport("not connected".into()));
        }

        let Some(out_rx) = state.out_rx.take() else {
            return Err(Error::Transport("inbound already subscribed".into()));
        };

        state.tasks.push(tokio::spawn(forward(out_rx, dst)));
        Ok(())
    }

    /// Stop the backend, drain its tasks, and drop the inbound destination.
    ///
    /// Idempotent; repeat calls (and close before connect) return `Ok`.
    async fn close(&self) -> Result<()> {
        // ---
        let tasks = {
            let mut state = self.state.lock().await;
            if !state.running {
                return Ok(());
            }
            state.running = false;
            state.in_tx = None;
            std::mem::take(&mut state.tasks)
        };

        // Join outside the lock: the pump finishes once every in_tx clone
        // is gone, then the forwarder finishes and drops the destination.
        for task in tasks {
            let _ = task.await;
        }
        Ok(())
    }
}

/// Create a new in-process mock transport.
///
/// This transport is always available and requires no external resources.
pub fn create_mock_transport(_config: &ChatConfig) -> Result<TransportPtr> {
    // ---
    let (in_tx, in_rx) = mpsc::channel(BACKEND_QUEUE_CAPACITY);
    let (out_tx, out_rx) = mpsc::channel(BACKEND_QUEUE_CAPACITY);

    let transport = MockTransport {
        // ---
        state: Mutex::new(State {
            running: false,
            in_tx: Some(in_tx),
            in_rx: Some(in_rx),
            out_tx: Some(out_tx),
            out_rx: Some(out_rx),
            tasks: Vec::new(),
        }),
    };

    Ok(Arc::new(transport))
}
