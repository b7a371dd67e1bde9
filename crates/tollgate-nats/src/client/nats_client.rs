//! NATS client wrapper and connection management.
//!
//! `async-nats` multiplexes every operation over a single TCP connection and
//! reconnects on its own, so one [`NatsClient`] is shared by the whole
//! process. Cloning it is an `Arc` clone.

use std::sync::Arc;
use std::time::Duration;

use async_nats::{ConnectOptions, jetstream};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::timeout;

use super::nats_config::NatsConfig;
use crate::kv::{KvBucket, KvKey, KvStore, SessionData, SessionKey, SessionsBucket};
use crate::{Error, Result, TRACING_TARGET_CLIENT, TRACING_TARGET_CONNECTION};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RECONNECT_DELAY_MS: u64 = 30_000;

/// Session cache store type used by the server.
pub type SessionStore = KvStore<SessionKey, SessionData, SessionsBucket>;

/// NATS client wrapper with its JetStream context.
#[derive(Debug, Clone)]
pub struct NatsClient {
    inner: Arc<NatsClientInner>,
}

#[derive(Debug)]
struct NatsClientInner {
    jetstream: jetstream::Context,
}

impl NatsClient {
    /// Validates the configuration and connects.
    #[tracing::instrument(skip(config), target = TRACING_TARGET_CONNECTION, fields(nats_url = %config.nats_url))]
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        config.validate()?;

        let mut connect_opts = ConnectOptions::new()
            .name(config.name())
            .ping_interval(config.ping_interval())
            .request_timeout(config.request_timeout());

        if let Some(token) = config.nats_token.clone() {
            connect_opts = connect_opts.token(token);
        }

        if let Some(timeout) = config.connect_timeout() {
            connect_opts = connect_opts.connection_timeout(timeout);
        }

        if let Some(max_reconnects) = config.max_reconnects_option() {
            connect_opts = connect_opts.max_reconnects(max_reconnects);
        }

        let reconnect_delay_ms = config.reconnect_delay().as_millis().min(u64::MAX as u128) as u64;
        connect_opts = connect_opts.reconnect_delay_callback(move |attempts| {
            Duration::from_millis(std::cmp::min(
                reconnect_delay_ms.saturating_mul(2_u64.pow(attempts.min(16) as u32)),
                MAX_RECONNECT_DELAY_MS,
            ))
        });

        let connect_timeout = config.connect_timeout().unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        let client = timeout(
            connect_timeout,
            async_nats::connect_with_options(config.nats_url.as_str(), connect_opts),
        )
        .await
        .map_err(|_| Error::timeout(connect_timeout))?
        .map_err(|e| Error::Connection(Box::new(e)))?;

        let jetstream = jetstream::new(client.clone());

        let server_info = client.server_info();
        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            server_host = %server_info.host,
            server_version = %server_info.version,
            "Connected to NATS"
        );

        Ok(Self {
            inner: Arc::new(NatsClientInner { jetstream }),
        })
    }
}

// Key-value store getters
impl NatsClient {
    /// Gets or creates a KV store whose entries expire after `ttl`.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CLIENT)]
    pub async fn kv_store_with_ttl<K, V, B>(&self, ttl: Duration) -> Result<KvStore<K, V, B>>
    where
        K: KvKey,
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
        B: KvBucket,
    {
        KvStore::with_ttl(&self.inner.jetstream, ttl).await
    }

    /// Gets or creates the login session store.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CLIENT)]
    pub async fn session_store(&self, ttl: Duration) -> Result<SessionStore> {
        self.kv_store_with_ttl(ttl).await
    }
}
