//! User provisioning: registration and administrative CRUD.

use std::fmt;
use std::sync::Arc;

use tollgate_postgres::PgError;
use tollgate_postgres::model::{NewUser, UpdateUser, User};

use crate::TRACING_TARGET_USERS;
use crate::handler::{Error, ErrorKind, Result};
use crate::service::{CredentialStore, Deadline, PasswordHasher, PermissionStore};

/// Creates, lists, renames and deletes users.
#[derive(Clone)]
pub struct UserDirectory {
    credentials: Arc<dyn CredentialStore>,
    permissions: Arc<dyn PermissionStore>,
    password_hasher: PasswordHasher,
    deadline: Deadline,
    default_role_id: i32,
}

impl UserDirectory {
    /// Creates a new [`UserDirectory`]. Self-registered users get
    /// `default_role_id`.
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        permissions: Arc<dyn PermissionStore>,
        password_hasher: PasswordHasher,
        deadline: Deadline,
        default_role_id: i32,
    ) -> Self {
        Self {
            credentials,
            permissions,
            password_hasher,
            deadline,
            default_role_id,
        }
    }

    /// Registers a user with the default role.
    #[tracing::instrument(skip(self, password), target = TRACING_TARGET_USERS)]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        self.create_user(name, email, password, self.default_role_id)
            .await
    }

    /// Creates a user with an explicit role.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::AlreadyExists`] if the email is taken.
    /// - [`ErrorKind::BadRequest`] if the role does not exist.
    #[tracing::instrument(skip(self, password), target = TRACING_TARGET_USERS)]
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role_id: i32,
    ) -> Result<User> {
        let email = email.trim().to_lowercase();

        let role = self
            .deadline
            .run("find_role", self.permissions.find_role(role_id))
            .await??;
        if role.is_none() {
            return Err(ErrorKind::BadRequest
                .with_message(format!("Role {role_id} does not exist"))
                .with_resource("role"));
        }

        let taken = self
            .deadline
            .run(
                "count_users_by_email",
                self.credentials.count_users_by_email(&email),
            )
            .await??;
        if taken > 0 {
            tracing::info!(
                target: TRACING_TARGET_USERS,
                email = %email,
                "email already registered"
            );
            return Err(ErrorKind::AlreadyExists.into_error());
        }

        let new_user = NewUser {
            name: name.trim().to_owned(),
            email: email.clone(),
            password: self.password_hasher.hash_password(password)?,
            role_id,
        };

        let user = self
            .deadline
            .run("create_user", self.credentials.create_user(new_user))
            .await?
            .map_err(|error| already_exists_or_internal(error, &email))?;

        tracing::info!(
            target: TRACING_TARGET_USERS,
            user_id = user.id,
            role_id = user.role_id,
            "user created"
        );

        Ok(user)
    }

    /// Lists every user.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let users = self
            .deadline
            .run("list_users", self.credentials.list_users())
            .await??;
        Ok(users)
    }

    /// Changes a user's display name.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_USERS)]
    pub async fn rename_user(&self, user_id: i32, name: &str) -> Result<User> {
        let updates = UpdateUser {
            name: Some(name.trim().to_owned()),
            ..UpdateUser::default()
        };

        let user = self
            .deadline
            .run("update_user", self.credentials.update_user(user_id, updates))
            .await??;

        user.ok_or_else(|| ErrorKind::NotFound.with_resource("user"))
    }

    /// Permanently deletes a user.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_USERS)]
    pub async fn delete_user(&self, user_id: i32) -> Result<()> {
        let deleted = self
            .deadline
            .run("delete_user", self.credentials.delete_user(user_id))
            .await??;

        if !deleted {
            return Err(ErrorKind::NotFound.with_resource("user"));
        }

        tracing::info!(target: TRACING_TARGET_USERS, user_id, "user deleted");
        Ok(())
    }
}

/// Two concurrent registrations of one email both pass the count check. The
/// loser hits the unique index.
fn already_exists_or_internal(error: PgError, email: &str) -> Error<'static> {
    if error.is_unique_violation() {
        tracing::info!(
            target: TRACING_TARGET_USERS,
            email = %email,
            "email registered concurrently"
        );
        return ErrorKind::AlreadyExists.into_error();
    }

    error.into()
}

impl fmt::Debug for UserDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserDirectory")
            .field("deadline", &self.deadline)
            .field("default_role_id", &self.default_role_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::service::store::memory::{MemoryCredentials, MemoryPermissions};

    fn directory() -> (UserDirectory, Arc<MemoryCredentials>) {
        let credentials = Arc::new(MemoryCredentials::new());
        let directory = UserDirectory::new(
            credentials.clone(),
            Arc::new(MemoryPermissions::new()),
            PasswordHasher::new(),
            Deadline::new(Duration::from_secs(5)),
            3,
        );
        (directory, credentials)
    }

    #[tokio::test]
    async fn register_uses_the_default_role_and_hashes() -> anyhow::Result<()> {
        let (directory, _) = directory();

        let user = directory.register(" Bob ", "Bob@X.com", "secret-pw").await?;
        assert_eq!(user.name, "Bob");
        assert_eq!(user.email, "bob@x.com");
        assert_eq!(user.role_id, 3);
        assert!(user.password.starts_with("$argon2id$"));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_already_exists() -> anyhow::Result<()> {
        let (directory, _) = directory();
        directory.register("Bob", "bob@x.com", "secret-pw").await?;

        let error = directory
            .register("Robert", "BOB@x.com", "other-pw")
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AlreadyExists);
        Ok(())
    }

    #[test]
    fn unique_violation_maps_to_already_exists() {
        use tollgate_postgres::error::{DatabaseErrorKind, DieselError};

        let error = PgError::Query(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(String::from("users_email_key")),
        ));
        let error = already_exists_or_internal(error, "bob@x.com");
        assert_eq!(error.kind(), ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn unknown_role_is_bad_request() {
        let (directory, _) = directory();
        let error = directory
            .create_user("Eve", "eve@x.com", "secret-pw", 42)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn rename_and_delete_missing_user_is_not_found() {
        let (directory, _) = directory();

        let error = directory.rename_user(99, "Ghost").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);

        let error = directory.delete_user(99).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn rename_then_delete() -> anyhow::Result<()> {
        let (directory, credentials) = directory();
        let user = credentials.insert("Old", "old@x.com", "hash", 3);

        let renamed = directory.rename_user(user.id, " New ").await?;
        assert_eq!(renamed.name, "New");

        directory.delete_user(user.id).await?;
        assert!(directory.list_users().await?.is_empty());
        Ok(())
    }
}
