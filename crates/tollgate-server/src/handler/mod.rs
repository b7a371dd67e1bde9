//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! Every method is a `POST /<package>.<Service>/<Method>` with a JSON body.
//! The router returned by [`routes`] carries no authentication of its own;
//! install the request gate with [`RouterGateExt::with_gate`].
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler
//! [`RouterGateExt::with_gate`]: crate::middleware::RouterGateExt::with_gate

mod authentication;
mod error;
mod response;
mod users;

use axum::Router;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
pub use crate::handler::response::{ErrorResponse, Reply};
pub use crate::handler::users::UserView;
use crate::service::ServiceState;

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns a [`Router`] with all routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .merge(authentication::routes())
        .merge(users::routes())
        .fallback(handler)
}
