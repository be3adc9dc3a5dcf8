//! Client SDK for realtime messaging over pluggable transports
//!
//! This library provides a simple, ergonomic API for talking to a realtime
//! messaging backend: connect a [`Client`] over a [`Transport`], send
//! messages on named channels, and register any number of independent
//! subscribers who each receive a live copy of inbound messages.
//!
//! Sends run through a configurable, cancellable retry policy; fan-out to
//! subscribers is best-effort and never blocks on a slow consumer; and
//! shutdown is a single idempotent sequence that leaves no task behind.
//!

// Import all sub modules once...
mod chat_config;
mod client;
mod domain;
mod error;
mod registry;
mod retry;
mod transport;

mod macros;

#[allow(unused_imports)]
pub(crate) use macros::{log_debug, log_error, log_info, log_warn};

// Re-export main types
pub use chat_config::{ChatConfig, ConfigBuilder};
pub use client::Client;

pub use error::{Error, Result};

pub use registry::{SubscriptionHandle, SubscriptionId};
pub use retry::{BackoffConfig, RetryPolicy};

pub use transport::{create_mock_transport, create_transport, TransportKind};

// --- public re-exports
pub use domain::{
    //
    Message,
    Transport,
    TransportPtr,
};
