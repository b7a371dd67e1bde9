//! Key-value key types and traits.

use std::fmt;
use std::str::FromStr;

use derive_more::Display;

use crate::Error;

/// Marker trait for KV key types.
///
/// `Display` renders the bucket key and `FromStr` parses it back.
pub trait KvKey: fmt::Debug + fmt::Display + FromStr + Clone + Send + Sync + 'static {}

/// Longest token accepted as a session key.
const MAX_TOKEN_LEN: usize = 256;

/// Session key derived from an opaque login token.
///
/// Rendered as `auth.token.<token>`. NATS KV keys only allow
/// `[A-Za-z0-9_=/.-]`, so the namespace is dot-separated and the token itself
/// must not contain a dot.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
#[display("{}{_0}", SessionKey::PREFIX)]
pub struct SessionKey(String);

impl SessionKey {
    /// Namespace of every session key.
    pub const PREFIX: &'static str = "auth.token.";

    /// Creates a key from a client-supplied token.
    ///
    /// Fails for tokens that can never name an issued session. The error
    /// does not echo the token.
    pub fn new(token: impl Into<String>) -> Result<Self, Error> {
        let token = token.into();

        if token.is_empty() {
            return Err(Error::invalid_key(Self::PREFIX, "token is empty"));
        }

        if token.len() > MAX_TOKEN_LEN {
            return Err(Error::invalid_key(Self::PREFIX, "token is too long"));
        }

        let valid = token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'='));
        if !valid {
            return Err(Error::invalid_key(
                Self::PREFIX,
                "token contains invalid characters",
            ));
        }

        Ok(Self(token))
    }

    /// Returns the token without the namespace.
    #[inline]
    pub fn token(&self) -> &str {
        &self.0
    }
}

impl KvKey for SessionKey {}

impl FromStr for SessionKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| Error::invalid_key(s, "missing session namespace"))?;
        Self::new(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_with_namespace() {
        let key = SessionKey::new("3f2a9c").unwrap();
        assert_eq!(key.to_string(), "auth.token.3f2a9c");
        assert_eq!(key.token(), "3f2a9c");
    }

    #[test]
    fn parses_rendered_key() {
        let key: SessionKey = "auth.token.abc_DEF-123".parse().unwrap();
        assert_eq!(key.token(), "abc_DEF-123");
    }

    #[test]
    fn rejects_unsafe_tokens() {
        assert!(SessionKey::new("").is_err());
        assert!(SessionKey::new("a.b").is_err());
        assert!(SessionKey::new("a*").is_err());
        assert!(SessionKey::new(">").is_err());
        assert!(SessionKey::new("has space").is_err());
        assert!(SessionKey::new("x".repeat(MAX_TOKEN_LEN + 1)).is_err());
        assert!("token.abc".parse::<SessionKey>().is_err());
    }
}
