use thiserror::Error;

/// Errors that can occur during client operations
#[derive(Error, Debug)]
pub enum Error {
    /// Required configuration was missing or invalid at construction
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation attempted after `close()` has begun
    #[error("client closed")]
    Closed,

    /// Transport failed to establish the session or register the inbound
    /// subscription; the client stays usable for another connect attempt
    #[error("connection failed: {0}")]
    Connection(String),

    /// Failure reported by the transport while sending; eligible for retry
    #[error("transport error: {0}")]
    Transport(String),

    /// The caller-supplied cancellation fired before the operation completed
    #[error("operation cancelled")]
    Cancelled,
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;
