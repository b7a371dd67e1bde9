//! Permission rules keyed by `(role, section, route)`.

use diesel::prelude::*;

use crate::schema::role_rights;

/// Four independent permission flags for one `(role, section, route)` triple.
///
/// The triple is unique. A triple without a row grants nothing.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = role_rights)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RoleRight {
    pub id: i32,
    pub role_id: i32,
    /// Coarse routing namespace, matched against the `x-link-service` header.
    pub section: String,
    /// `Service/Method` name of the guarded operation.
    pub route: String,
    pub r_create: bool,
    pub r_read: bool,
    pub r_update: bool,
    pub r_delete: bool,
}

