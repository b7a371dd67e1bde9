//! Application state and dependency injection.

mod authorization;
mod config;
mod deadline;
mod security;
mod session;
mod state;
mod store;
mod user_directory;

pub use crate::service::authorization::{Action, AuthorizationEngine};
pub use crate::service::config::{ServiceConfig, ServiceConfigBuilder};
pub use crate::service::deadline::Deadline;
pub use crate::service::security::{PasswordHasher, SessionToken, TokenIssuer};
pub use crate::service::session::{Identity, SessionManager};
pub use crate::service::state::ServiceState;
pub use crate::service::store::{CredentialStore, PermissionStore, SessionCache};
pub use crate::service::user_directory::UserDirectory;

#[cfg(test)]
pub(crate) use crate::service::store::memory;
