use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tollgate_nats::{NatsClient, NatsConfig, SessionStore};
use tollgate_postgres::{PgClient, PgClientMigrationExt, PgConfig};

use crate::{Error, Result};

/// Default values for configuration options.
mod defaults {
    /// Sessions expire one day after login.
    pub const SESSION_TTL_SECS: u64 = 86_400;

    /// Expected value of the `x-link-service` header.
    pub const GATE_SECTION: &str = "be";

    /// Role given to self-registered users (`viewer`).
    pub const DEFAULT_ROLE_ID: i32 = 3;

    /// Upper bound on a single store or cache call.
    pub const STORE_TIMEOUT_SECS: u64 = 10;
}

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
#[builder(
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct ServiceConfig {
    /// Postgres database configuration.
    #[cfg_attr(feature = "config", command(flatten))]
    pub postgres_config: PgConfig,

    /// NATS configuration.
    #[cfg_attr(feature = "config", command(flatten))]
    pub nats_config: NatsConfig,

    /// Session lifetime in seconds, used as the bucket `max_age`.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "session-ttl-secs",
            env = "SESSION_TTL_SECS",
            default_value_t = defaults::SESSION_TTL_SECS
        )
    )]
    #[builder(default = "defaults::SESSION_TTL_SECS")]
    pub session_ttl_secs: u64,

    /// Section every request must declare in `x-link-service`.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "gate-section",
            env = "GATE_SECTION",
            default_value = defaults::GATE_SECTION
        )
    )]
    #[builder(default = "defaults::GATE_SECTION.to_owned()")]
    pub gate_section: String,

    /// Role assigned by `AuthService/Register`.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "default-role-id",
            env = "DEFAULT_ROLE_ID",
            default_value_t = defaults::DEFAULT_ROLE_ID
        )
    )]
    #[builder(default = "defaults::DEFAULT_ROLE_ID")]
    pub default_role_id: i32,

    /// Deadline for each store or cache call in seconds.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "store-timeout-secs",
            env = "STORE_TIMEOUT_SECS",
            default_value_t = defaults::STORE_TIMEOUT_SECS
        )
    )]
    #[builder(default = "defaults::STORE_TIMEOUT_SECS")]
    pub store_timeout_secs: u64,

    /// Infer the action of methods missing from the route table from their
    /// name prefix instead of denying them.
    #[cfg_attr(
        feature = "config",
        arg(long = "infer-route-actions", env = "INFER_ROUTE_ACTIONS")
    )]
    #[builder(default)]
    pub infer_route_actions: bool,
}

impl ServiceConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Returns the session lifetime.
    #[inline]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Returns the per-call store deadline.
    #[inline]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    /// Connects to Postgres database and runs migrations.
    pub async fn connect_postgres(&self) -> Result<PgClient> {
        let pg_client = self.postgres_config.clone().build().map_err(|e| {
            Error::external("postgres", "Failed to create database client").with_source(e)
        })?;

        pg_client.run_pending_migrations().await.map_err(|e| {
            Error::external("postgres", "Failed to apply database migrations").with_source(e)
        })?;

        Ok(pg_client)
    }

    /// Connects to NATS and opens the session bucket.
    pub async fn connect_nats(&self) -> Result<SessionStore> {
        let nats_client = NatsClient::connect(self.nats_config.clone())
            .await
            .map_err(|e| Error::external("NATS", "Failed to connect to NATS").with_source(e))?;

        nats_client
            .session_store(self.session_ttl())
            .await
            .map_err(|e| Error::external("NATS", "Failed to open session bucket").with_source(e))
    }

    /// Validates values that `clap` parsing does not cover.
    pub fn validate(&self) -> Result<()> {
        if self.session_ttl_secs == 0 {
            return Err(Error::config("Session TTL must be at least 1 second"));
        }

        if self.store_timeout_secs == 0 {
            return Err(Error::config("Store timeout must be at least 1 second"));
        }

        if self.gate_section.trim().is_empty() {
            return Err(Error::config("Gate section cannot be empty"));
        }

        self.postgres_config
            .validate()
            .map_err(|e| Error::config("Invalid Postgres configuration").with_source(e))?;
        self.nats_config
            .validate()
            .map_err(|e| Error::config("Invalid NATS configuration").with_source(e))?;

        Ok(())
    }
}

impl ServiceConfigBuilder {
    /// Wrapper for builder validation that returns String errors.
    fn validate(builder: &ServiceConfigBuilder) -> std::result::Result<(), String> {
        if builder.session_ttl_secs == Some(0) {
            return Err("Session TTL must be at least 1 second".to_string());
        }

        if builder.store_timeout_secs == Some(0) {
            return Err("Store timeout must be at least 1 second".to_string());
        }

        if let Some(section) = &builder.gate_section
            && section.trim().is_empty()
        {
            return Err("Gate section cannot be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ServiceConfigBuilder {
        ServiceConfig::builder()
            .with_postgres_config(PgConfig::new("postgresql://localhost/tollgate"))
            .with_nats_config(NatsConfig::new("nats://127.0.0.1:4222"))
    }

    #[test]
    fn builder_applies_defaults() -> anyhow::Result<()> {
        let config = builder().build()?;
        assert_eq!(config.session_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.gate_section, "be");
        assert_eq!(config.default_role_id, 3);
        assert_eq!(config.store_timeout(), Duration::from_secs(10));
        assert!(!config.infer_route_actions);
        config.validate()?;
        Ok(())
    }

    #[test]
    fn builder_rejects_zero_timeouts() {
        assert!(builder().with_session_ttl_secs(0u64).build().is_err());
        assert!(builder().with_store_timeout_secs(0u64).build().is_err());
        assert!(builder().with_gate_section("  ").build().is_err());
    }

    #[test]
    fn validate_checks_nested_configs() -> anyhow::Result<()> {
        let config = builder()
            .with_postgres_config(PgConfig::new("mysql://localhost"))
            .build()?;
        assert!(config.validate().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn invalid_postgres_config_fails_before_connecting() -> anyhow::Result<()> {
        let config = builder().with_postgres_config(PgConfig::new("")).build()?;

        assert!(config.connect_postgres().await.is_err());
        assert!(config.connect_postgres().await.is_err());
        assert!(config.postgres_config.postgres_url.is_empty());
        Ok(())
    }

    #[test]
    fn missing_connection_configs_fail_to_build() {
        assert!(ServiceConfig::builder().build().is_err());
    }
}
