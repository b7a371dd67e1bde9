use async_trait::async_trait;
use jiff::Timestamp;
use tollgate_postgres::model::{NewUser, Role, RoleRight, UpdateUser, User};
use tollgate_postgres::query::{RoleRepository, RoleRightRepository, UserRepository};
use tollgate_postgres::{PgClient, PgResult};

use super::{CredentialStore, PermissionStore};

#[async_trait]
impl CredentialStore for PgClient {
    async fn find_user_by_email(&self, email: &str) -> PgResult<Option<User>> {
        let mut conn = self.get_connection().await?;
        conn.find_user_by_email(email).await
    }

    async fn count_users_by_email(&self, email: &str) -> PgResult<i64> {
        let mut conn = self.get_connection().await?;
        conn.count_users_by_email(email).await
    }

    async fn update_last_access(&self, user_id: i32, at: Timestamp) -> PgResult<()> {
        let mut conn = self.get_connection().await?;
        conn.update_last_access(user_id, at).await
    }

    async fn create_user(&self, new_user: NewUser) -> PgResult<User> {
        let mut conn = self.get_connection().await?;
        conn.create_user(new_user).await
    }

    async fn update_user(&self, user_id: i32, updates: UpdateUser) -> PgResult<Option<User>> {
        let mut conn = self.get_connection().await?;
        conn.update_user(user_id, updates).await
    }

    async fn delete_user(&self, user_id: i32) -> PgResult<bool> {
        let mut conn = self.get_connection().await?;
        conn.delete_user(user_id).await
    }

    async fn list_users(&self) -> PgResult<Vec<User>> {
        let mut conn = self.get_connection().await?;
        conn.list_users().await
    }
}

#[async_trait]
impl PermissionStore for PgClient {
    async fn find_role_right(
        &self,
        role_id: i32,
        section: &str,
        route: &str,
    ) -> PgResult<Option<RoleRight>> {
        let mut conn = self.get_connection().await?;
        conn.find_role_right(role_id, section, route).await
    }

    async fn find_role(&self, role_id: i32) -> PgResult<Option<Role>> {
        let mut conn = self.get_connection().await?;
        conn.find_role_by_id(role_id).await
    }
}
