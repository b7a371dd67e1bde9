//! HTTP server startup and lifecycle management.

/// Tracing target for server startup events.
pub const TRACING_TARGET_STARTUP: &str = "tollgate_cli::server::startup";

/// Tracing target for server shutdown events.
pub const TRACING_TARGET_SHUTDOWN: &str = "tollgate_cli::server::shutdown";

mod error;
mod http_server;
mod lifecycle;
mod shutdown;

pub use error::{ServerError, ServerResult};
pub use http_server::serve_http as serve;
