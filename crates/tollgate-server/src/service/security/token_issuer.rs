//! Opaque session tokens.

use std::fmt;

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// An opaque, unguessable session token.
///
/// The token carries no structure. `Debug` redacts it and there is no
/// `Display`, so it cannot end up in logs by accident. Use
/// [`SessionToken::fingerprint`] to correlate log lines instead.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wraps a token received from a client.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the raw token, consuming the wrapper.
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns a short SHA-256 prefix of the token, safe to log.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..8])
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken")
            .field(&format_args!("{}", self.fingerprint()))
            .finish()
    }
}

/// Issues new session tokens.
///
/// Tokens are the 32 hex digits of a random (v4) UUID: 122 bits from the
/// operating system's CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenIssuer;

impl TokenIssuer {
    /// Creates a new instance of the [`TokenIssuer`] service.
    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// Generates a new token.
    pub fn issue(&self) -> SessionToken {
        SessionToken(Uuid::new_v4().simple().to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn issued_tokens_are_unique() {
        let issuer = TokenIssuer::new();
        let tokens: HashSet<_> = (0..1_000).map(|_| issuer.issue()).collect();
        assert_eq!(tokens.len(), 1_000);
    }

    #[test]
    fn issued_tokens_are_valid_session_keys() {
        let token = TokenIssuer::new().issue();
        assert_eq!(token.as_str().len(), 32);
        assert!(tollgate_nats::kv::SessionKey::new(token.as_str()).is_ok());
    }

    #[test]
    fn debug_does_not_leak_the_token() {
        let token = SessionToken::new("0123456789abcdef0123456789abcdef");
        let debug = format!("{token:?}");
        assert!(!debug.contains(token.as_str()));
        assert!(debug.contains(&token.fingerprint()));
        assert_eq!(token.fingerprint().len(), 16);
    }
}
