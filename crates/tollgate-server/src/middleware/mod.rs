//! Middleware for `axum::Router` and HTTP request processing.
//!
//! ```rust,no_run
//! use axum::Router;
//! use tollgate_server::middleware::{
//!     RecoveryConfig, RouterGateExt, RouterObservabilityExt, RouterRecoveryExt,
//! };
//! use tollgate_server::service::{ServiceConfig, ServiceState};
//!
//! # async fn example(config: ServiceConfig) -> tollgate_server::Result<()> {
//! let state = ServiceState::from_config(&config).await?;
//! let app: Router = tollgate_server::handler::routes()
//!     .with_gate(state.clone())
//!     .with_state(state)
//!     .with_observability()
//!     .with_recovery(&RecoveryConfig::default());
//! # Ok(())
//! # }
//! ```

mod gate;
mod observability;
mod recovery;

pub use gate::{
    GatePolicy, LINK_SERVICE, MethodName, RouteTable, RouterGateExt, RoutePolicy, gate,
    infer_policy,
};
pub use observability::{REQUEST_ID, RouterObservabilityExt};
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
