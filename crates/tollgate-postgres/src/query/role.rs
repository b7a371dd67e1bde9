use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::model::Role;
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for role lookups.
pub trait RoleRepository {
    /// Finds a role by id.
    fn find_role_by_id(&mut self, role_id: i32)
    -> impl Future<Output = PgResult<Option<Role>>> + Send;
}

impl RoleRepository for PgConnection {
    async fn find_role_by_id(&mut self, role_id: i32) -> PgResult<Option<Role>> {
        use schema::roles::{self, dsl};

        roles::table
            .filter(dsl::id.eq(role_id))
            .select(Role::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }
}
