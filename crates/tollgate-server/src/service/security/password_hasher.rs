//! Password hashing and verification using Argon2id.

use std::sync::LazyLock;

use argon2::password_hash::{Error as ArgonError, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier};
use rand::Rng;
use rand::rngs::OsRng;

use crate::handler::{ErrorKind, Result};

/// Target identifier for password hashing logs.
const TRACING_TARGET_PASSWORD_HASHER: &str = "tollgate_server::service::password_hasher";

/// Default-parameter hash used if the random dummy hash cannot be computed.
const FALLBACK_DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hash of a random password, computed once per process.
///
/// Uses the same parameters as [`PasswordHasher`], so verifying against it
/// costs as much as verifying a real account.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    let password_len = rand::random_range(16..32);
    let dummy_password: String = (0..password_len)
        .map(|_| rand::rng().sample(rand::distr::Alphanumeric) as char)
        .collect();

    SaltString::try_from_rng(&mut OsRng)
        .ok()
        .and_then(|salt| {
            Argon2::default()
                .hash_password(dummy_password.as_bytes(), &salt)
                .ok()
                .map(|hash| hash.to_string())
        })
        .unwrap_or_else(|| FALLBACK_DUMMY_HASH.to_owned())
});

#[cfg(test)]
thread_local! {
    static ARGON2_CALLS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

#[inline]
fn count_argon2_call() {
    #[cfg(test)]
    ARGON2_CALLS.with(|calls| calls.set(calls.get() + 1));
}

/// Argon2id password hasher with a random salt per hash.
///
/// Hashes are PHC strings, so parameters and salt travel with the hash and
/// can be stored as is.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Creates a new instance of the [`PasswordHasher`] service.
    pub fn new() -> Self {
        let argon2 = Argon2::default();
        Self { argon2 }
    }

    /// Hashes a password with a freshly generated salt.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InternalServerError`] if salt generation or
    /// hashing fails.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::try_from_rng(&mut OsRng).map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET_PASSWORD_HASHER,
                error = %e,
                "failed to generate password salt"
            );

            ErrorKind::InternalServerError.with_context("Salt generation error")
        })?;

        count_argon2_call();
        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(
                    target: TRACING_TARGET_PASSWORD_HASHER,
                    error = %e,
                    "password hashing failed"
                );

                ErrorKind::InternalServerError.with_context("Hash generation error")
            })?;

        Ok(password_hash.to_string())
    }

    /// Verifies a password against a stored PHC hash.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidCredentials`] if the password does not match.
    /// - [`ErrorKind::InternalServerError`] if the stored hash is malformed or
    ///   verification itself fails.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<()> {
        let parsed_hash = PasswordHash::new(stored_hash).map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET_PASSWORD_HASHER,
                error = %e,
                "stored password hash is malformed"
            );

            ErrorKind::InternalServerError.with_context("Hash format error")
        })?;

        count_argon2_call();
        match self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(()),
            Err(ArgonError::Password) => {
                tracing::debug!(
                    target: TRACING_TARGET_PASSWORD_HASHER,
                    "password mismatch"
                );

                Err(ErrorKind::InvalidCredentials.into_error())
            }
            Err(e) => {
                tracing::error!(
                    target: TRACING_TARGET_PASSWORD_HASHER,
                    error = %e,
                    "password verification failed"
                );

                Err(ErrorKind::InternalServerError.with_context("Verification error"))
            }
        }
    }

    /// Burns the time of a real verification against a precomputed hash.
    ///
    /// Used when no account matches the email, so unknown accounts and wrong
    /// passwords take comparable time. Always returns `false`.
    pub fn verify_dummy_password(&self, password: &str) -> bool {
        let _ = self.verify_password(password, &DUMMY_HASH);
        false
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
