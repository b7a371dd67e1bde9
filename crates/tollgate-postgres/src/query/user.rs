//! User repository backing the credential store.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff::Timestamp;

use crate::model::{NewUser, UpdateUser, User};
use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Normalizes an email for storage and lookup.
#[inline]
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Repository for user records.
pub trait UserRepository {
    /// Finds a user by email. Comparison is case-insensitive.
    fn find_user_by_email(
        &mut self,
        email: &str,
    ) -> impl Future<Output = PgResult<Option<User>>> + Send;

    /// Counts users registered with `email`.
    fn count_users_by_email(&mut self, email: &str) -> impl Future<Output = PgResult<i64>> + Send;

    /// Inserts a user. The email is normalized and the name trimmed.
    fn create_user(&mut self, new_user: NewUser) -> impl Future<Output = PgResult<User>> + Send;

    /// Applies a partial update. Returns `None` if the user does not exist.
    fn update_user(
        &mut self,
        user_id: i32,
        updates: UpdateUser,
    ) -> impl Future<Output = PgResult<Option<User>>> + Send;

    /// Records a successful login.
    fn update_last_access(
        &mut self,
        user_id: i32,
        at: Timestamp,
    ) -> impl Future<Output = PgResult<()>> + Send;

    /// Permanently removes a user. Returns whether a row was deleted.
    fn delete_user(&mut self, user_id: i32) -> impl Future<Output = PgResult<bool>> + Send;

    /// Lists every user ordered by id.
    fn list_users(&mut self) -> impl Future<Output = PgResult<Vec<User>>> + Send;
}

impl UserRepository for PgConnection {
    async fn find_user_by_email(&mut self, email: &str) -> PgResult<Option<User>> {
        use schema::users::{self, dsl};

        users::table
            .filter(dsl::email.eq(normalize_email(email)))
            .select(User::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn count_users_by_email(&mut self, email: &str) -> PgResult<i64> {
        use schema::users::{self, dsl};

        users::table
            .filter(dsl::email.eq(normalize_email(email)))
            .count()
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn create_user(&mut self, mut new_user: NewUser) -> PgResult<User> {
        use schema::users;

        new_user.name = new_user.name.trim().to_owned();
        new_user.email = normalize_email(&new_user.email);

        let user = diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        tracing::debug!(target: TRACING_TARGET_QUERY, user_id = user.id, role_id = user.role_id, "User created");
        Ok(user)
    }

    async fn update_user(&mut self, user_id: i32, mut updates: UpdateUser) -> PgResult<Option<User>> {
        use schema::users::{self, dsl};

        if let Some(name) = updates.name.as_mut() {
            *name = name.trim().to_owned();
        }

        diesel::update(users::table.filter(dsl::id.eq(user_id)))
            .set(&updates)
            .returning(User::as_returning())
            .get_result(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn update_last_access(&mut self, user_id: i32, at: Timestamp) -> PgResult<()> {
        use schema::users::{self, dsl};

        let updated = diesel::update(users::table.filter(dsl::id.eq(user_id)))
            .set(dsl::last_access.eq(Some(jiff_diesel::Timestamp::from(at))))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        // The user was deleted between lookup and update.
        if updated == 0 {
            return Err(PgError::Query(diesel::result::Error::NotFound));
        }

        Ok(())
    }

    async fn delete_user(&mut self, user_id: i32) -> PgResult<bool> {
        use schema::users::{self, dsl};

        let deleted = diesel::delete(users::table.filter(dsl::id.eq(user_id)))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }

    async fn list_users(&mut self) -> PgResult<Vec<User>> {
        use schema::users::{self, dsl};

        users::table
            .order(dsl::id.asc())
            .select(User::as_select())
            .load(self)
            .await
            .map_err(PgError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_email;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }
}
