// src/domain/transport.rs

//! Transport domain abstractions.
//!
//! This module defines the domain-level transport interface used by the
//! client to reach a realtime backend. It intentionally avoids any
//! reference to concrete protocols or client libraries.
//!
//! The transport layer is responsible only for delivering messages to and
//! from the backend. Higher-level semantics such as subscriber fan-out,
//! retries, or lifecycle management are handled by [`Client`](crate::Client).
//!
//! Concrete implementations of this interface live under `src/transport/`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::Result;

/// A single chat message.
///
/// Messages are immutable values: the client stamps the sender identity and
/// the UTC timestamp at send time, and nothing mutates a message after
/// creation. The one exception is the transport, which may re-stamp the
/// sender identity on messages it delivers back to the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Named channel the message was sent on.
    pub channel: String,

    /// Sender identity. Outbound messages carry the local client identity;
    /// the backend stamps its own identity on delivery.
    pub from: String,

    /// Message body.
    pub body: String,

    /// UTC instant the message was produced.
    pub at: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current UTC instant.
    pub fn new(
        channel: impl Into<String>,
        from: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        // ---
        Self {
            channel: channel.into(),
            from: from.into(),
            body: body.into(),
            at: Utc::now(),
        }
    }
}

/// Transport abstraction.
///
/// A `Transport` carries messages between the client and a realtime
/// backend. It defines the minimal contract required by the client without
/// committing to any specific protocol. Retries, deadlines, and subscriber
/// fan-out are provided by the layer above.
///
/// Implementations must ensure that:
/// - `close()` is idempotent and never errors on repeat calls.
/// - After `close()` returns, the implementation has dropped every clone of
///   the inbound sender it received via `subscribe_inbound()`. The client
///   relies on this to observe end-of-inbound during shutdown.
/// - A `send()` future may be dropped by the caller at any await point
///   (cancellation); this must not corrupt transport state.
///
/// The mock transport serves as the reference implementation of these
/// semantics.
///
/// # Notes
///
/// This trait uses `async_trait`; the expanded documentation may show
/// explicit lifetimes and a boxed `Future`. This is an implementation
/// detail — consumers should treat methods as normal `async fn`s.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    // ---
    /// Establish the backend session.
    ///
    /// `deadline` bounds the attempt; implementations must fail with a
    /// connection or transport error rather than block past it.
    async fn connect(&self, deadline: std::time::Duration) -> Result<()>;

    /// Deliver one message to the backend.
    ///
    /// Fails with a transport error if the session is not established.
    async fn send(&self, msg: Message) -> Result<()>;

    /// Register the destination the transport pushes inbound messages into.
    ///
    /// Fails with a transport error if the session is not established.
    /// Delivery into `dst` must be non-blocking; a full destination drops
    /// that message rather than stalling the transport.
    async fn subscribe_inbound(&self, dst: mpsc::Sender<Message>) -> Result<()>;

    /// Stop producing inbound messages and release backend resources.
    async fn close(&self) -> Result<()>;
}

/// Shared transport pointer.
///
/// This is an `Arc<dyn Transport>`, which means:
/// - `.clone()` is cheap (only increments a reference count)
/// - Multiple clones share the same underlying connection
/// - Used to erase concrete transport types behind a stable domain interface.
pub type TransportPtr = Arc<dyn Transport>;
