//! Diesel models for the credential and permission tables.

mod role;
mod role_right;
mod user;

pub use role::Role;
pub use role_right::RoleRight;
pub use user::{NewUser, UpdateUser, User};
