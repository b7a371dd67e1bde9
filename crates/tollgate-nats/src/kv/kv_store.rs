//! Type-safe NATS KV store wrapper.

use std::marker::PhantomData;
use std::time::Duration;

use async_nats::jetstream::{self, kv};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{KvBucket, KvKey};
use crate::{Error, Result, TRACING_TARGET_KV};

/// Type-safe NATS KV store wrapper.
///
/// Generic over the key type `K`, the JSON-encoded value type `V` and the
/// bucket `B`.
#[derive(Clone)]
pub struct KvStore<K, V, B>
where
    K: KvKey,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
    B: KvBucket,
{
    store: kv::Store,
    _key: PhantomData<K>,
    _value: PhantomData<V>,
    _bucket: PhantomData<B>,
}

impl<K, V, B> KvStore<K, V, B>
where
    K: KvKey,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
    B: KvBucket,
{
    /// Gets or creates the bucket with `ttl` as the entry `max_age`.
    ///
    /// An existing bucket must already expire entries after `ttl`; any other
    /// `max_age` fails with [`Error::InvalidConfig`].
    #[tracing::instrument(skip(jetstream), target = TRACING_TARGET_KV)]
    pub(crate) async fn with_ttl(jetstream: &jetstream::Context, ttl: Duration) -> Result<Self> {
        let store = match jetstream.get_key_value(B::NAME).await {
            Ok(store) => {
                let status = store
                    .status()
                    .await
                    .map_err(|e| Error::operation("kv_status", e.to_string()))?;
                ensure_max_age(B::NAME, status.max_age(), ttl)?;
                store
            }
            Err(_) => {
                tracing::info!(
                    target: TRACING_TARGET_KV,
                    bucket = %B::NAME,
                    ttl_secs = ttl.as_secs(),
                    "Creating KV bucket"
                );

                let config = kv::Config {
                    bucket: B::NAME.to_string(),
                    description: B::DESCRIPTION.to_string(),
                    max_age: ttl,
                    ..Default::default()
                };

                jetstream
                    .create_key_value(config)
                    .await
                    .map_err(|e| Error::operation("kv_create", e.to_string()))?
            }
        };

        Ok(Self {
            store,
            _key: PhantomData,
            _value: PhantomData,
            _bucket: PhantomData,
        })
    }

    /// Puts a value, resetting the key's expiry.
    #[tracing::instrument(skip(self, key, value), target = TRACING_TARGET_KV)]
    pub async fn put(&self, key: &K, value: &V) -> Result<KvEntry> {
        let key_str = key.to_string();
        let json = serde_json::to_vec(value)?;
        let size = json.len();
        let revision = self
            .store
            .put(&key_str, json.into())
            .await
            .map_err(|e| Error::operation("kv_put", e.to_string()))?;

        tracing::debug!(
            target: TRACING_TARGET_KV,
            bucket = %B::NAME,
            revision,
            size_bytes = size,
            "Put value to KV store"
        );

        Ok(KvEntry {
            revision,
            size: size as u64,
        })
    }

    /// Gets a value with its metadata.
    ///
    /// Missing, expired, deleted and purged keys are `Ok(None)`. A payload
    /// that does not decode as `V` is [`Error::Serialization`].
    #[tracing::instrument(skip(self, key), target = TRACING_TARGET_KV)]
    pub async fn get(&self, key: &K) -> Result<Option<KvValue<V>>> {
        let key_str = key.to_string();
        let entry = self
            .store
            .entry(&key_str)
            .await
            .map_err(|e| Error::operation("kv_get", e.to_string()))?;

        let Some(entry) = entry.filter(|entry| entry.operation == kv::Operation::Put) else {
            tracing::debug!(target: TRACING_TARGET_KV, bucket = %B::NAME, "Key not found in KV store");
            return Ok(None);
        };

        let size = entry.value.len();
        let value = serde_json::from_slice(&entry.value).inspect_err(|e| {
            tracing::warn!(
                target: TRACING_TARGET_KV,
                bucket = %B::NAME,
                revision = entry.revision,
                error = %e,
                "Stored value does not decode"
            );
        })?;

        Ok(Some(KvValue {
            value,
            revision: entry.revision,
            size: size as u64,
        }))
    }

    /// Gets a value without metadata.
    pub async fn get_value(&self, key: &K) -> Result<Option<V>> {
        Ok(self.get(key).await?.map(|kv| kv.value))
    }

    /// Deletes a key. Deleting an absent key succeeds.
    #[tracing::instrument(skip(self, key), target = TRACING_TARGET_KV)]
    pub async fn delete(&self, key: &K) -> Result<()> {
        let key_str = key.to_string();
        self.store
            .purge(&key_str)
            .await
            .map_err(|e| Error::operation("kv_delete", e.to_string()))?;

        tracing::debug!(target: TRACING_TARGET_KV, bucket = %B::NAME, "Deleted key from KV store");
        Ok(())
    }
}

/// Rejects an existing bucket whose `max_age` differs from the requested TTL.
///
/// A bucket created with another TTL, or with none, would keep sessions alive
/// for the wrong duration.
fn ensure_max_age(bucket: &str, actual: Duration, expected: Duration) -> Result<()> {
    if actual == expected {
        return Ok(());
    }

    tracing::error!(
        target: TRACING_TARGET_KV,
        bucket = %bucket,
        bucket_ttl_secs = actual.as_secs(),
        requested_ttl_secs = expected.as_secs(),
        "Existing KV bucket uses a different TTL"
    );

    Err(Error::invalid_config(format!(
        "bucket '{bucket}' expires entries after {}s, expected {}s",
        actual.as_secs(),
        expected.as_secs()
    )))
}

/// Metadata of a written entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvEntry {
    pub revision: u64,
    pub size: u64,
}

/// Decoded value with its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvValue<V> {
    pub value: V,
    pub revision: u64,
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_bucket_ttl_is_accepted() {
        let ttl = Duration::from_secs(86_400);
        assert!(ensure_max_age("auth_sessions", ttl, ttl).is_ok());
    }

    #[test]
    fn mismatched_bucket_ttl_is_invalid_config() {
        let expected = Duration::from_secs(86_400);

        for actual in [Duration::ZERO, Duration::from_secs(3_600)] {
            let error = ensure_max_age("auth_sessions", actual, expected)
                .expect_err("bucket with another TTL must be rejected");
            assert!(matches!(error, Error::InvalidConfig { .. }));
        }
    }
}
