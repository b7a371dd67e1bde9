//! Session lifecycle: login, verify, logout.

mod identity;
mod manager;

pub use identity::Identity;
pub use manager::SessionManager;
