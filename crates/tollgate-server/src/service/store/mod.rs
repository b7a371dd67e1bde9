//! Contracts of the three backing stores.
//!
//! The core services only talk to these traits. [`PgClient`] implements the
//! credential and permission stores, [`SessionStore`] the session cache.
//!
//! [`PgClient`]: tollgate_postgres::PgClient
//! [`SessionStore`]: tollgate_nats::SessionStore

mod nats;
mod postgres;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use jiff::Timestamp;
use tollgate_nats::kv::{SessionData, SessionKey};
use tollgate_postgres::PgResult;
use tollgate_postgres::model::{NewUser, Role, RoleRight, UpdateUser, User};

/// Durable user records.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Finds a user by email. `Ok(None)` means no such user.
    async fn find_user_by_email(&self, email: &str) -> PgResult<Option<User>>;

    /// Counts users registered with `email`.
    async fn count_users_by_email(&self, email: &str) -> PgResult<i64>;

    /// Records a successful login.
    async fn update_last_access(&self, user_id: i32, at: Timestamp) -> PgResult<()>;

    async fn create_user(&self, new_user: NewUser) -> PgResult<User>;

    /// Returns `None` if the user does not exist.
    async fn update_user(&self, user_id: i32, updates: UpdateUser) -> PgResult<Option<User>>;

    /// Returns whether a user was deleted.
    async fn delete_user(&self, user_id: i32) -> PgResult<bool>;

    async fn list_users(&self) -> PgResult<Vec<User>>;
}

/// Durable `(role, section, route)` permission rules.
#[async_trait]
pub trait PermissionStore: Send + Sync + 'static {
    /// Finds the rule for a triple. `Ok(None)` means no rule exists.
    async fn find_role_right(
        &self,
        role_id: i32,
        section: &str,
        route: &str,
    ) -> PgResult<Option<RoleRight>>;

    /// Finds a role by id.
    async fn find_role(&self, role_id: i32) -> PgResult<Option<Role>>;
}

/// Expiring session entries keyed by token.
///
/// Entries expire after the cache's configured time to live.
#[async_trait]
pub trait SessionCache: Send + Sync + 'static {
    /// Stores a session, replacing any previous entry under `key`.
    async fn set(&self, key: &SessionKey, session: &SessionData) -> tollgate_nats::Result<()>;

    /// Reads a session. `Ok(None)` means absent, expired or deleted.
    async fn get(&self, key: &SessionKey) -> tollgate_nats::Result<Option<SessionData>>;

    /// Deletes a session. Deleting an absent key succeeds.
    async fn del(&self, key: &SessionKey) -> tollgate_nats::Result<()>;
}
