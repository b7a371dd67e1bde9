#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;

pub mod extract;
pub mod handler;
pub mod middleware;
pub mod service;

pub use crate::error::{BoxedError, Error, ErrorKind, Result};

// Tracing target constants for consistent logging.

/// Tracing target for login, logout and session verification.
pub const TRACING_TARGET_SESSION: &str = "tollgate_server::session";

/// Tracing target for permission checks.
pub const TRACING_TARGET_AUTHORIZATION: &str = "tollgate_server::authorization";

/// Tracing target for the request gate.
pub const TRACING_TARGET_GATE: &str = "tollgate_server::gate";

/// Tracing target for user provisioning.
pub const TRACING_TARGET_USERS: &str = "tollgate_server::users";

/// Tracing target for store and cache adapters.
pub const TRACING_TARGET_STORE: &str = "tollgate_server::store";
