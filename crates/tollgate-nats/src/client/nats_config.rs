//! NATS connection configuration.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const DEFAULT_NAME: &str = "tollgate";
const DEFAULT_MAX_RECONNECTS: usize = 10;
const DEFAULT_RECONNECT_DELAY_SECS: u64 = 2;
const DEFAULT_PING_INTERVAL_SECS: u64 = 30;

/// Configuration for the NATS connection.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct NatsConfig {
    /// NATS server URL (comma-separated for clustering)
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-url", env = "NATS_URL", default_value = "nats://127.0.0.1:4222")
    )]
    pub nats_url: String,

    /// Authentication token
    #[cfg_attr(feature = "config", arg(long = "nats-token", env = "NATS_TOKEN"))]
    pub nats_token: Option<String>,

    /// Client connection name for debugging and monitoring
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-client-name", env = "NATS_CLIENT_NAME")
    )]
    pub nats_client_name: Option<String>,

    /// Connection timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-connect-timeout", env = "NATS_CONNECT_TIMEOUT_SECS")
    )]
    pub nats_connect_timeout: Option<u64>,

    /// Request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-request-timeout", env = "NATS_REQUEST_TIMEOUT_SECS")
    )]
    pub nats_request_timeout: Option<u64>,

    /// Maximum number of reconnection attempts (0 = unlimited)
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-max-reconnects", env = "NATS_MAX_RECONNECTS")
    )]
    pub nats_max_reconnects: Option<usize>,
}

impl NatsConfig {
    /// Creates a configuration for the given server URL(s).
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            nats_url: server_url.into(),
            nats_token: None,
            nats_client_name: None,
            nats_connect_timeout: None,
            nats_request_timeout: None,
            nats_max_reconnects: None,
        }
    }

    /// Returns the client name, using the default if not set.
    #[inline]
    pub fn name(&self) -> &str {
        self.nats_client_name.as_deref().unwrap_or(DEFAULT_NAME)
    }

    /// Splits the comma-separated server list.
    pub fn servers(&self) -> Vec<&str> {
        self.nats_url.split(',').map(str::trim).collect()
    }

    #[inline]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.nats_connect_timeout.map(Duration::from_secs)
    }

    #[inline]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.nats_request_timeout.map(Duration::from_secs)
    }

    #[inline]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(DEFAULT_RECONNECT_DELAY_SECS)
    }

    #[inline]
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(DEFAULT_PING_INTERVAL_SECS)
    }

    /// Returns the reconnect limit, `None` meaning unlimited.
    #[inline]
    pub fn max_reconnects_option(&self) -> Option<usize> {
        let max = self.nats_max_reconnects.unwrap_or(DEFAULT_MAX_RECONNECTS);
        if max == 0 { None } else { Some(max) }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.nats_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.nats_client_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.nats_connect_timeout = Some(secs);
        self
    }

    #[must_use]
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.nats_request_timeout = Some(secs);
        self
    }

    #[must_use]
    pub fn with_max_reconnects(mut self, max_reconnects: usize) -> Self {
        self.nats_max_reconnects = Some(max_reconnects);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        for server in self.servers() {
            if server.is_empty() {
                return Err(Error::invalid_config("server URL cannot be empty"));
            }
            if !server.starts_with("nats://") && !server.starts_with("tls://") {
                return Err(Error::invalid_config(format!(
                    "invalid server URL format: {server}"
                )));
            }
        }

        if self.nats_token.as_deref().is_some_and(str::is_empty) {
            return Err(Error::invalid_config("token cannot be empty when set"));
        }

        if self.nats_connect_timeout == Some(0) || self.nats_request_timeout == Some(0) {
            return Err(Error::invalid_config("timeouts must be at least one second"));
        }

        Ok(())
    }
}

impl fmt::Debug for NatsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NatsConfig")
            .field("nats_url", &self.nats_url)
            .field("nats_token", &self.nats_token.as_ref().map(|_| "***"))
            .field("nats_client_name", &self.nats_client_name)
            .field("nats_connect_timeout", &self.nats_connect_timeout)
            .field("nats_request_timeout", &self.nats_request_timeout)
            .field("nats_max_reconnects", &self.nats_max_reconnects)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = NatsConfig::new("nats://localhost:4222");
        assert_eq!(config.servers(), vec!["nats://localhost:4222"]);
        assert_eq!(config.name(), DEFAULT_NAME);
        assert_eq!(config.connect_timeout(), None);
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.max_reconnects_option(), Some(DEFAULT_MAX_RECONNECTS));
        assert_eq!(config.ping_interval(), Duration::from_secs(30));
    }

    #[test]
    fn builder() {
        let config = NatsConfig::new("nats://localhost:4222")
            .with_token("secret")
            .with_name("gate")
            .with_connect_timeout_secs(5)
            .with_request_timeout_secs(15)
            .with_max_reconnects(0);

        assert_eq!(config.name(), "gate");
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.max_reconnects_option(), None);
    }

    #[test]
    fn multiple_servers() {
        let config = NatsConfig::new("nats://a:4222, nats://b:4222");
        assert_eq!(config.servers(), vec!["nats://a:4222", "nats://b:4222"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation() {
        assert!(NatsConfig::new("nats://localhost:4222").validate().is_ok());
        assert!(NatsConfig::new("").validate().is_err());
        assert!(NatsConfig::new("localhost:4222").validate().is_err());
        assert!(
            NatsConfig::new("nats://localhost:4222")
                .with_token("")
                .validate()
                .is_err()
        );
        assert!(
            NatsConfig::new("nats://localhost:4222")
                .with_connect_timeout_secs(0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn debug_hides_token() {
        let config = NatsConfig::new("nats://localhost:4222").with_token("secret");
        assert!(!format!("{config:?}").contains("secret"));
    }
}
