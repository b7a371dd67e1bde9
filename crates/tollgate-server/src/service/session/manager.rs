use std::fmt;
use std::sync::Arc;

use jiff::Timestamp;
use tollgate_nats::kv::{SessionData, SessionKey};

use super::Identity;
use crate::TRACING_TARGET_SESSION;
use crate::handler::{ErrorKind, Result};
use crate::service::{
    CredentialStore, Deadline, PasswordHasher, SessionCache, SessionToken, TokenIssuer,
};

/// Login, logout and verification of opaque session tokens.
///
/// Users are read from the [`CredentialStore`], sessions live in the
/// [`SessionCache`]. A login writes the store first and the cache second, so
/// a usable token always reflects a last access time that is already durable.
/// Nothing is retried: the first failing step fails the whole operation.
#[derive(Clone)]
pub struct SessionManager {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionCache>,
    password_hasher: PasswordHasher,
    token_issuer: TokenIssuer,
    deadline: Deadline,
}

impl SessionManager {
    /// Creates a new [`SessionManager`].
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionCache>,
        password_hasher: PasswordHasher,
        deadline: Deadline,
    ) -> Self {
        Self {
            credentials,
            sessions,
            password_hasher,
            token_issuer: TokenIssuer::new(),
            deadline,
        }
    }

    /// Exchanges credentials for a new session token.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidCredentials`] for an unknown email or a wrong
    ///   password. Both look the same to the caller.
    /// - [`ErrorKind::Cancelled`] if a store or cache call exceeds its deadline.
    /// - [`ErrorKind::InternalServerError`] if the store or cache fails. No
    ///   token is returned and no session is readable afterwards.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_SESSION)]
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionToken> {
        let email = email.trim().to_lowercase();

        let user = self
            .deadline
            .run(
                "find_user_by_email",
                self.credentials.find_user_by_email(&email),
            )
            .await?
            .map_err(|error| {
                tracing::error!(
                    target: TRACING_TARGET_SESSION,
                    operation = "find_user_by_email",
                    email = %email,
                    error = %error,
                    "credential lookup failed"
                );
                ErrorKind::InternalServerError.into_error()
            })?;

        let Some(user) = user else {
            self.password_hasher.verify_dummy_password(password);
            tracing::info!(
                target: TRACING_TARGET_SESSION,
                email = %email,
                "login rejected: unknown email"
            );
            return Err(ErrorKind::InvalidCredentials.into_error());
        };

        self.password_hasher
            .verify_password(password, &user.password)
            .inspect_err(|error| {
                if error.kind() == ErrorKind::InvalidCredentials {
                    tracing::info!(
                        target: TRACING_TARGET_SESSION,
                        user_id = user.id,
                        "login rejected: wrong password"
                    );
                }
            })?;

        let token = self.token_issuer.issue();
        let key = SessionKey::new(token.as_str()).map_err(|error| {
            tracing::error!(
                target: TRACING_TARGET_SESSION,
                error = %error,
                "issued token is not a valid session key"
            );
            ErrorKind::InternalServerError.into_error()
        })?;

        let now = Timestamp::now();
        self.deadline
            .run(
                "update_last_access",
                self.credentials.update_last_access(user.id, now),
            )
            .await?
            .map_err(|error| {
                tracing::error!(
                    target: TRACING_TARGET_SESSION,
                    operation = "update_last_access",
                    user_id = user.id,
                    error = %error,
                    "failed to record last access"
                );
                ErrorKind::InternalServerError.into_error()
            })?;

        let session = SessionData {
            user_id: user.id,
            name: user.name,
            email: user.email,
            role_id: user.role_id,
            last_access: Some(now),
        };

        self.deadline
            .run("session_set", self.sessions.set(&key, &session))
            .await?
            .map_err(|error| {
                tracing::error!(
                    target: TRACING_TARGET_SESSION,
                    operation = "session_set",
                    user_id = user.id,
                    token = %token.fingerprint(),
                    error = %error,
                    "failed to store session"
                );
                ErrorKind::InternalServerError.into_error()
            })?;

        tracing::info!(
            target: TRACING_TARGET_SESSION,
            user_id = user.id,
            role_id = user.role_id,
            token = %token.fingerprint(),
            "login succeeded"
        );

        Ok(token)
    }

    /// Ends the session of `token`. Ending an absent session succeeds.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_SESSION)]
    pub async fn logout(&self, token: &SessionToken) -> Result<()> {
        // Such a token was never issued, so there is nothing to delete.
        let Ok(key) = SessionKey::new(token.as_str()) else {
            return Ok(());
        };

        self.deadline
            .run("session_del", self.sessions.del(&key))
            .await?
            .map_err(|error| {
                tracing::error!(
                    target: TRACING_TARGET_SESSION,
                    operation = "session_del",
                    token = %token.fingerprint(),
                    error = %error,
                    "failed to delete session"
                );
                ErrorKind::InternalServerError.into_error()
            })?;

        tracing::info!(
            target: TRACING_TARGET_SESSION,
            token = %token.fingerprint(),
            "logout succeeded"
        );

        Ok(())
    }

    /// Resolves `token` to the identity stored at login.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::Unauthenticated`] if no session exists for the token,
    ///   including expired and logged out sessions.
    /// - [`ErrorKind::Cancelled`] if the cache exceeds its deadline.
    /// - [`ErrorKind::InternalServerError`] if the cache fails or holds a
    ///   payload that cannot be decoded.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_SESSION)]
    pub async fn verify(&self, token: &SessionToken) -> Result<Identity> {
        let Ok(key) = SessionKey::new(token.as_str()) else {
            tracing::debug!(
                target: TRACING_TARGET_SESSION,
                "token cannot name a session"
            );
            return Err(ErrorKind::Unauthenticated.into_error());
        };

        let session = self
            .deadline
            .run("session_get", self.sessions.get(&key))
            .await?
            .map_err(|error| {
                if error.is_serialization() {
                    tracing::error!(
                        target: TRACING_TARGET_SESSION,
                        operation = "session_get",
                        token = %token.fingerprint(),
                        error = %error,
                        "malformed session payload"
                    );
                } else {
                    tracing::error!(
                        target: TRACING_TARGET_SESSION,
                        operation = "session_get",
                        token = %token.fingerprint(),
                        error = %error,
                        "session lookup failed"
                    );
                }
                ErrorKind::InternalServerError.into_error()
            })?;

        let Some(session) = session else {
            tracing::debug!(
                target: TRACING_TARGET_SESSION,
                token = %token.fingerprint(),
                "session not found"
            );
            return Err(ErrorKind::Unauthenticated.into_error());
        };

        Ok(Identity::from_session(session, token.clone()))
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::service::store::memory::{Fault, MemoryCredentials, MemorySessions};

    struct Fixture {
        manager: SessionManager,
        credentials: Arc<MemoryCredentials>,
        sessions: Arc<MemorySessions>,
        user_id: i32,
    }

    fn fixture() -> anyhow::Result<Fixture> {
        let hasher = PasswordHasher::new();
        let credentials = Arc::new(MemoryCredentials::new());
        let sessions = Arc::new(MemorySessions::new());
        let user = credentials.insert("Alice", "a@x.com", &hasher.hash_password("pw1")?, 2);

        let manager = SessionManager::new(
            credentials.clone(),
            sessions.clone(),
            hasher,
            Deadline::new(Duration::from_secs(5)),
        );

        Ok(Fixture {
            manager,
            credentials,
            sessions,
            user_id: user.id,
        })
    }

    #[tokio::test]
    async fn login_then_verify_returns_the_user() -> anyhow::Result<()> {
        let f = fixture()?;

        let token = f.manager.login(" A@X.com ", "pw1").await?;
        let identity = f.manager.verify(&token).await?;

        assert_eq!(identity.user_id, f.user_id);
        assert_eq!(identity.name, "Alice");
        assert_eq!(identity.email, "a@x.com");
        assert_eq!(identity.role_id, 2);
        assert_eq!(identity.token, token);

        let stored = f.credentials.user(f.user_id).expect("user exists");
        assert_eq!(stored.last_access_at(), identity.last_access);
        assert!(identity.last_access.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() -> anyhow::Result<()> {
        let f = fixture()?;

        let unknown = f.manager.login("nobody@x.com", "pw1").await.unwrap_err();
        let wrong = f.manager.login("a@x.com", "pw2").await.unwrap_err();

        assert_eq!(unknown.kind(), ErrorKind::InvalidCredentials);
        assert_eq!(wrong.kind(), ErrorKind::InvalidCredentials);
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(f.sessions.len(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn store_failure_on_lookup_is_internal() -> anyhow::Result<()> {
        let f = fixture()?;
        f.credentials
            .inject("find_user_by_email", Fault::Unavailable);

        let error = f.manager.login("a@x.com", "pw1").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        Ok(())
    }

    #[tokio::test]
    async fn failed_last_access_update_issues_no_session() -> anyhow::Result<()> {
        let f = fixture()?;
        f.credentials
            .inject("update_last_access", Fault::Unavailable);

        let error = f.manager.login("a@x.com", "pw1").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        assert_eq!(f.sessions.len(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn failed_cache_write_returns_no_token() -> anyhow::Result<()> {
        let f = fixture()?;
        f.sessions.inject("set", Fault::Unavailable);

        let error = f.manager.login("a@x.com", "pw1").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        assert_eq!(f.sessions.len(), 0);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_store_write_is_cancelled_before_the_cache_write() -> anyhow::Result<()> {
        let f = fixture()?;
        f.credentials.inject("update_last_access", Fault::Hang);

        let error = f.manager.login("a@x.com", "pw1").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Cancelled);
        assert_eq!(f.sessions.len(), 0);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_cache_write_returns_no_token() -> anyhow::Result<()> {
        let f = fixture()?;
        f.sessions.inject("set", Fault::Hang);

        let error = f.manager.login("a@x.com", "pw1").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Cancelled);
        assert_eq!(f.sessions.len(), 0);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_cache_read_is_cancelled_not_unauthenticated() -> anyhow::Result<()> {
        let f = fixture()?;
        let token = f.manager.login("a@x.com", "pw1").await?;
        f.sessions.inject("get", Fault::Hang);

        let error = f.manager.verify(&token).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Cancelled);
        assert_eq!(f.sessions.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn logout_ends_the_session_and_is_idempotent() -> anyhow::Result<()> {
        let f = fixture()?;
        let token = f.manager.login("a@x.com", "pw1").await?;

        f.manager.logout(&token).await?;
        f.manager.logout(&token).await?;

        let error = f.manager.verify(&token).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unauthenticated);
        Ok(())
    }

    #[tokio::test]
    async fn logout_transport_failure_is_internal() -> anyhow::Result<()> {
        let f = fixture()?;
        let token = f.manager.login("a@x.com", "pw1").await?;
        f.sessions.inject("del", Fault::Unavailable);

        let error = f.manager.logout(&token).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        Ok(())
    }

    #[tokio::test]
    async fn expired_session_is_unauthenticated() -> anyhow::Result<()> {
        let f = fixture()?;
        let token = f.manager.login("a@x.com", "pw1").await?;
        f.sessions.expire(token.as_str());

        let error = f.manager.verify(&token).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unauthenticated);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_session_is_internal() -> anyhow::Result<()> {
        let f = fixture()?;
        let token = f.manager.login("a@x.com", "pw1").await?;
        f.sessions.corrupt(token.as_str());

        let error = f.manager.verify(&token).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        Ok(())
    }

    #[tokio::test]
    async fn cache_failure_is_not_unauthenticated() -> anyhow::Result<()> {
        let f = fixture()?;
        let token = f.manager.login("a@x.com", "pw1").await?;
        f.sessions.inject("get", Fault::Unavailable);

        let error = f.manager.verify(&token).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_or_unsafe_tokens_are_unauthenticated() -> anyhow::Result<()> {
        let f = fixture()?;

        for raw in ["deadbeef", "", "a.b", "x y"] {
            let error = f.manager.verify(&SessionToken::new(raw)).await.unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Unauthenticated, "{raw:?}");
        }
        Ok(())
    }
}
