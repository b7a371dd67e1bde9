//! User accounts: identity, credential hash and role assignment.

use diesel::prelude::*;
use jiff_diesel::Timestamp;

use crate::schema::users;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    /// Unique user identifier.
    pub id: i32,
    /// Display name.
    pub name: String,
    /// Unique, lower-cased email address.
    pub email: String,
    /// Argon2 PHC string of the user's password.
    pub password: String,
    /// Assigned role.
    pub role_id: i32,
    /// Time of the last successful login.
    pub last_access: Option<Timestamp>,
}

impl User {
    /// Returns the last successful login as a [`jiff::Timestamp`].
    #[inline]
    pub fn last_access_at(&self) -> Option<jiff::Timestamp> {
        self.last_access.map(jiff::Timestamp::from)
    }
}

/// Data for inserting a new user.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUser {
    pub name: String,
    pub email: String,
    /// Argon2 PHC string, never the plaintext.
    pub password: String,
    pub role_id: i32,
}

/// Partial update of a user. `None` fields are left untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateUser {
    pub name: Option<String>,
    pub role_id: Option<i32>,
    pub last_access: Option<Timestamp>,
}
