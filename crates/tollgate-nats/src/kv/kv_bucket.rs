//! Key-value bucket configuration traits.

/// Marker trait for KV bucket configuration.
pub trait KvBucket: Clone + Send + Sync + 'static {
    /// Bucket name used in NATS KV.
    const NAME: &'static str;

    /// Human-readable description for the bucket.
    const DESCRIPTION: &'static str;
}

/// Bucket holding login sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SessionsBucket;

impl KvBucket for SessionsBucket {
    const NAME: &'static str = "auth_sessions";
    const DESCRIPTION: &'static str = "Login sessions keyed by opaque token";
}
