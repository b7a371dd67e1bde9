//! Typed NATS key-value stores.
//!
//! - [`KvStore<K, V, B>`]: typed get/put/delete over one bucket
//! - [`KvKey`]: how a key type renders into a bucket key
//! - [`KvBucket`]: bucket name and description
//!
//! ```ignore
//! let sessions: KvStore<SessionKey, SessionData, SessionsBucket> =
//!     nats_client.kv_store_with_ttl(Duration::from_secs(86_400)).await?;
//!
//! sessions.put(&key, &session).await?;
//! let session = sessions.get_value(&key).await?;
//! ```

mod kv_bucket;
mod kv_key;
mod kv_store;
mod session;

pub use kv_bucket::{KvBucket, SessionsBucket};
pub use kv_key::{KvKey, SessionKey};
pub use kv_store::{KvEntry, KvStore, KvValue};
pub use session::SessionData;
