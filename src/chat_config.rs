//! Public, transport-agnostic client configuration.
//!
//! This type intentionally contains no transport-specific concepts
//! (e.g. websocket options). Transport layers are responsible for
//! interpreting this config into concrete connection settings.

use std::time::Duration;

use crate::{Error, Result, RetryPolicy};

/// Dial timeout applied when none is configured.
pub(crate) const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Client configuration and connection parameters.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Access key presented to the backend. Required, non-empty.
    pub api_key: String,

    /// Backend endpoint identifier (e.g. `"wss://chat.example.com"`,
    /// `"mock://"`). Required, non-empty. Its interpretation is
    /// transport-specific.
    pub endpoint: String,

    /// Upper bound on how long `connect()` may wait for the backend.
    ///
    /// A zero value is replaced with the 5s default at client construction.
    pub dial_timeout: Duration,

    /// Retry behavior applied to every outbound send.
    ///
    /// Defaults to [`RetryPolicy::None`]: the send is attempted exactly once.
    pub retry: RetryPolicy,
}

impl ChatConfig {
    /// Create a config with the given credentials and default behavior.
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        // ---
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            retry: RetryPolicy::None,
        }
    }

    /// Set an explicit dial timeout.
    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    /// Configure retry behavior for outbound sends.
    ///
    /// # Example
    ///
    /// ```
    /// use chat_sdk::{BackoffConfig, ChatConfig, RetryPolicy};
    ///
    /// let config = ChatConfig::new("key", "mock://")
    ///     .with_retry(RetryPolicy::ExponentialBackoff(BackoffConfig::default()));
    /// ```
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Check the required fields.
    pub(crate) fn validate(&self) -> Result<()> {
        // ---
        if self.api_key.is_empty() {
            return Err(Error::Config("api key required".into()));
        }
        if self.endpoint.is_empty() {
            return Err(Error::Config("endpoint required".into()));
        }
        Ok(())
    }
}

/// Builder for creating [`ChatConfig`] instances.
///
/// Provides clear separation between required fields (`api_key`,
/// `endpoint`) and optional behavior, with validation at `build()`.
///
/// # Example
///
/// ```
/// use chat_sdk::ConfigBuilder;
/// use std::time::Duration;
///
/// # fn example() -> chat_sdk::Result<()> {
/// let config = ConfigBuilder::new()
///     .api_key("demo")
///     .endpoint("wss://chat.example.com")
///     .dial_timeout(Duration::from_secs(3))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ConfigBuilder {
    // ---
    api_key: Option<String>,
    endpoint: Option<String>,
    dial_timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
}

impl ConfigBuilder {
    /// Create a new config builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the access key (required).
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the backend endpoint (required).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the dial timeout (optional, default 5s).
    pub fn dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = Some(timeout);
        self
    }

    /// Set the retry policy (optional, default no-retry).
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Validate the accumulated settings and produce a config.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `api_key` or `endpoint` is missing or
    /// empty.
    pub fn build(self) -> Result<ChatConfig> {
        // ---
        let config = ChatConfig {
            api_key: self.api_key.unwrap_or_default(),
            endpoint: self.endpoint.unwrap_or_default(),
            dial_timeout: self.dial_timeout.unwrap_or(DEFAULT_DIAL_TIMEOUT),
            retry: self.retry.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_builder_success() {
        // ---
        let config = ConfigBuilder::new()
            .api_key("test-api-key")
            .endpoint("wss://example.com")
            .dial_timeout(Duration::from_secs(3))
            .build()
            .expect("expected valid config");

        assert_eq!(config.api_key, "test-api-key");
        assert_eq!(config.endpoint, "wss://example.com");
        assert_eq!(config.dial_timeout, Duration::from_secs(3));
        assert!(matches!(config.retry, RetryPolicy::None));
    }

    #[test]
    fn test_builder_missing_api_key() {
        // ---
        let result = ConfigBuilder::new().endpoint("wss://example.com").build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_missing_endpoint() {
        // ---
        let result = ConfigBuilder::new().api_key("test-api-key").build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_empty_fields_rejected() {
        // ---
        let result = ConfigBuilder::new().api_key("").endpoint("wss://example.com").build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_default_dial_timeout() {
        // ---
        let config = ConfigBuilder::new()
            .api_key("test-api-key")
            .endpoint("wss://example.com")
            .build()
            .expect("expected valid config");

        assert_eq!(config.dial_timeout, DEFAULT_DIAL_TIMEOUT);
    }
}
