//! Middleware configuration for the HTTP server.
//!
//! ```bash
//! tollgate-cli --request-timeout 60
//! ```

use anyhow::{Result as AnyhowResult, anyhow};
use clap::Args;
use serde::{Deserialize, Serialize};
use tollgate_server::middleware::RecoveryConfig;

use crate::TRACING_TARGET_CONFIG;

/// Upper bound for the per-request timeout, in seconds.
const MAX_REQUEST_TIMEOUT: u64 = 300;

/// HTTP middleware configuration.
#[derive(Debug, Clone, Default, Args, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Recovery middleware configuration.
    ///
    /// Controls request timeout and panic recovery behavior.
    #[clap(flatten)]
    pub recovery: RecoveryConfig,
}

impl MiddlewareConfig {
    /// Validates middleware settings.
    ///
    /// The request timeout must be within 1-300 seconds.
    pub fn validate(&self) -> AnyhowResult<()> {
        let request_timeout = self.recovery.request_timeout;
        if request_timeout == 0 || request_timeout > MAX_REQUEST_TIMEOUT {
            return Err(anyhow!(
                "Request timeout {request_timeout} seconds is invalid. Must be between 1 and {MAX_REQUEST_TIMEOUT} seconds."
            ));
        }

        Ok(())
    }

    /// Logs middleware configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            request_timeout_secs = self.recovery.request_timeout,
            "Recovery configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_invalid_request_timeouts() {
        let mut config = MiddlewareConfig::default();
        assert!(config.validate().is_ok());

        config.recovery = RecoveryConfig::with_timeout_secs(0);
        assert!(config.validate().is_err());

        config.recovery = RecoveryConfig::with_timeout_secs(301);
        assert!(config.validate().is_err());

        config.recovery = RecoveryConfig::with_timeout_secs(60);
        assert!(config.validate().is_ok());
    }
}
