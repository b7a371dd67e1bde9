//! In-memory stores with injectable faults, for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use jiff::Timestamp;
use tollgate_nats::kv::{SessionData, SessionKey};
use tollgate_postgres::error::{DatabaseErrorKind, DieselError};
use tollgate_postgres::model::{NewUser, Role, RoleRight, UpdateUser, User};
use tollgate_postgres::{PgError, PgResult};

use super::{CredentialStore, PermissionStore, SessionCache};

/// Failure injected into a single store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    /// The store reports a transport failure.
    Unavailable,
    /// The call never completes.
    Hang,
}

#[derive(Debug, Default)]
struct Faults(Mutex<HashMap<&'static str, Fault>>);

impl Faults {
    fn inject(&self, operation: &'static str, fault: Fault) {
        self.0.lock().unwrap().insert(operation, fault);
    }

    fn get(&self, operation: &'static str) -> Option<Fault> {
        self.0.lock().unwrap().get(operation).copied()
    }

    async fn pg(&self, operation: &'static str) -> PgResult<()> {
        match self.get(operation) {
            None => Ok(()),
            Some(Fault::Unavailable) => Err(PgError::Unexpected("connection refused".into())),
            Some(Fault::Hang) => std::future::pending().await,
        }
    }

    async fn nats(&self, operation: &'static str) -> tollgate_nats::Result<()> {
        match self.get(operation) {
            None => Ok(()),
            Some(Fault::Unavailable) => {
                Err(tollgate_nats::Error::operation(operation, "no responders"))
            }
            Some(Fault::Hang) => std::future::pending().await,
        }
    }
}

/// Users kept in a vector.
#[derive(Debug)]
pub(crate) struct MemoryCredentials {
    users: Mutex<Vec<User>>,
    next_id: AtomicI32,
    faults: Faults,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(1),
            faults: Faults::default(),
        }
    }

    /// Inserts a user directly, bypassing faults.
    pub fn insert(&self, name: &str, email: &str, password_hash: &str, role_id: i32) -> User {
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: name.to_owned(),
            email: email.to_owned(),
            password: password_hash.to_owned(),
            role_id,
            last_access: None,
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn inject(&self, operation: &'static str, fault: Fault) {
        self.faults.inject(operation, fault);
    }

    pub fn user(&self, user_id: i32) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentials {
    async fn find_user_by_email(&self, email: &str) -> PgResult<Option<User>> {
        self.faults.pg("find_user_by_email").await?;
        let email = email.trim().to_lowercase();
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn count_users_by_email(&self, email: &str) -> PgResult<i64> {
        self.faults.pg("count_users_by_email").await?;
        let email = email.trim().to_lowercase();
        let users = self.users.lock().unwrap();
        Ok(users.iter().filter(|u| u.email == email).count() as i64)
    }

    async fn update_last_access(&self, user_id: i32, at: Timestamp) -> PgResult<()> {
        self.faults.pg("update_last_access").await?;
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(PgError::Query(DieselError::NotFound))?;
        user.last_access = Some(at.into());
        Ok(())
    }

    async fn create_user(&self, new_user: NewUser) -> PgResult<User> {
        self.faults.pg("create_user").await?;
        let email = new_user.email.trim().to_lowercase();
        if self.users.lock().unwrap().iter().any(|u| u.email == email) {
            return Err(PgError::Query(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                Box::new(String::from("users_email_key")),
            )));
        }

        Ok(self.insert(
            new_user.name.trim(),
            &email,
            &new_user.password,
            new_user.role_id,
        ))
    }

    async fn update_user(&self, user_id: i32, updates: UpdateUser) -> PgResult<Option<User>> {
        self.faults.pg("update_user").await?;
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == user_id) else {
            return Ok(None);
        };

        if let Some(name) = updates.name {
            user.name = name;
        }
        if let Some(role_id) = updates.role_id {
            user.role_id = role_id;
        }
        if let Some(last_access) = updates.last_access {
            user.last_access = Some(last_access);
        }

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, user_id: i32) -> PgResult<bool> {
        self.faults.pg("delete_user").await?;
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != user_id);
        Ok(users.len() < before)
    }

    async fn list_users(&self) -> PgResult<Vec<User>> {
        self.faults.pg("list_users").await?;
        Ok(self.users.lock().unwrap().clone())
    }
}

/// Roles and rules kept in vectors.
#[derive(Debug)]
pub(crate) struct MemoryPermissions {
    roles: Vec<Role>,
    rules: Mutex<Vec<RoleRight>>,
    faults: Faults,
}

impl MemoryPermissions {
    /// Creates a store with the `admin`, `editor` and `viewer` roles and no rules.
    pub fn new() -> Self {
        let roles = [(1, "admin"), (2, "editor"), (3, "viewer")]
            .into_iter()
            .map(|(id, name)| Role {
                id,
                name: name.to_owned(),
            })
            .collect();

        Self {
            roles,
            rules: Mutex::new(Vec::new()),
            faults: Faults::default(),
        }
    }

    /// Adds a rule. Flags are given as `[create, read, update, delete]`.
    pub fn grant(&self, role_id: i32, section: &str, route: &str, flags: [bool; 4]) {
        let mut rules = self.rules.lock().unwrap();
        rules.retain(|r| !(r.role_id == role_id && r.section == section && r.route == route));
        let id = rules.len() as i32 + 1;
        rules.push(RoleRight {
            id,
            role_id,
            section: section.to_owned(),
            route: route.to_owned(),
            r_create: flags[0],
            r_read: flags[1],
            r_update: flags[2],
            r_delete: flags[3],
        });
    }

    pub fn inject(&self, operation: &'static str, fault: Fault) {
        self.faults.inject(operation, fault);
    }
}

#[async_trait]
impl PermissionStore for MemoryPermissions {
    async fn find_role_right(
        &self,
        role_id: i32,
        section: &str,
        route: &str,
    ) -> PgResult<Option<RoleRight>> {
        self.faults.pg("find_role_right").await?;
        Ok(self
            .rules
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.role_id == role_id && r.section == section && r.route == route)
            .cloned())
    }

    async fn find_role(&self, role_id: i32) -> PgResult<Option<Role>> {
        self.faults.pg("find_role").await?;
        Ok(self.roles.iter().find(|r| r.id == role_id).cloned())
    }
}

/// Sessions kept as serialized JSON, like the real cache.
#[derive(Debug, Default)]
pub(crate) struct MemorySessions {
    entries: Mutex<HashMap<String, String>>,
    faults: Faults,
}

impl MemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&self, operation: &'static str, fault: Fault) {
        self.faults.inject(operation, fault);
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Replaces the payload stored for `token` with invalid JSON.
    pub fn corrupt(&self, token: &str) {
        let key = SessionKey::new(token).unwrap().to_string();
        self.entries
            .lock()
            .unwrap()
            .insert(key, "{\"userId\":".to_owned());
    }

    /// Drops the entry for `token`, as the cache does when its TTL elapses.
    pub fn expire(&self, token: &str) {
        let key = SessionKey::new(token).unwrap().to_string();
        self.entries.lock().unwrap().remove(&key);
    }
}

#[async_trait]
impl SessionCache for MemorySessions {
    async fn set(&self, key: &SessionKey, session: &SessionData) -> tollgate_nats::Result<()> {
        self.faults.nats("set").await?;
        let payload = serde_json::to_string(session)?;
        self.entries.lock().unwrap().insert(key.to_string(), payload);
        Ok(())
    }

    async fn get(&self, key: &SessionKey) -> tollgate_nats::Result<Option<SessionData>> {
        self.faults.nats("get").await?;
        let payload = self.entries.lock().unwrap().get(&key.to_string()).cloned();
        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    async fn del(&self, key: &SessionKey) -> tollgate_nats::Result<()> {
        self.faults.nats("del").await?;
        self.entries.lock().unwrap().remove(&key.to_string());
        Ok(())
    }
}
