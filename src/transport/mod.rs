//! Transport implementations.
//!
//! This module provides concrete implementations of the domain-level
//! `Transport` trait, exposed only through constructor functions.
//!
//! Domain code must not depend on transport-specific types.

mod mock;

pub use mock::create_mock_transport;

use crate::{ChatConfig, Error, Result, TransportPtr};

/// Selects which backend implementation [`create_transport`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    // ---
    /// In-process mock backend, always available.
    Mock,

    /// Real websocket backend.
    WebSocket,
}

/// Create a transport implementation of the given kind.
///
/// Only the mock is implemented today; requesting the websocket kind fails
/// until a real backend lands.
pub fn create_transport(kind: TransportKind, config: &ChatConfig) -> Result<TransportPtr> {
    // ---
    match kind {
        TransportKind::Mock => create_mock_transport(config),
        TransportKind::WebSocket => {
            Err(Error::Config("websocket transport not implemented".into()))
        }
    }
}
