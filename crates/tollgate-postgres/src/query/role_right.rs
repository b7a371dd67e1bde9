//! Role right repository backing the permission store.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::model::RoleRight;
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for `(role, section, route)` permission rules.
pub trait RoleRightRepository {
    /// Finds the rule for an exact `(role, section, route)` triple.
    ///
    /// `Ok(None)` means no rule exists, which callers must treat as
    /// "deny every action".
    fn find_role_right(
        &mut self,
        role_id: i32,
        section: &str,
        route: &str,
    ) -> impl Future<Output = PgResult<Option<RoleRight>>> + Send;
}

impl RoleRightRepository for PgConnection {
    async fn find_role_right(
        &mut self,
        role_id: i32,
        section: &str,
        route: &str,
    ) -> PgResult<Option<RoleRight>> {
        use schema::role_rights::{self, dsl};

        role_rights::table
            .filter(dsl::role_id.eq(role_id))
            .filter(dsl::section.eq(section))
            .filter(dsl::route.eq(route))
            .select(RoleRight::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }
}
