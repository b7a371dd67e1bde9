//! Repository traits implemented for [`PgConnection`].
//!
//! [`PgConnection`]: crate::PgConnection

mod role;
mod role_right;
mod user;

pub use role::RoleRepository;
pub use role_right::RoleRightRepository;
pub use user::UserRepository;
