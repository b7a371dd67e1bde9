//! The request gate: authentication and authorization of every call.
//!
//! For each request the gate, in order:
//!
//! 1. lets [`RoutePolicy::Public`] methods through untouched;
//! 2. rejects requests with neither `authorization` nor `x-link-service`
//!    (`Unauthenticated`);
//! 3. requires `x-link-service` to equal the configured section
//!    (`PermissionDenied`);
//! 4. requires `authorization: Bearer <token>` (`Unauthenticated`);
//! 5. verifies the session;
//! 6. resolves the method's [`RoutePolicy`] (`PermissionDenied` if unknown);
//! 7. authorizes the caller's role unless the method is session-only;
//! 8. stores the [`Identity`] in the request extensions.
//!
//! Any step may end the request. Nothing is retried.

mod method;
mod route_table;

use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, HeaderMap, HeaderName};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::Response;

pub use self::method::MethodName;
pub use self::route_table::{RoutePolicy, RouteTable, infer_policy};
use crate::TRACING_TARGET_GATE;
use crate::handler::{ErrorKind, Result};
use crate::service::{AuthorizationEngine, Identity, ServiceState, SessionManager, SessionToken};

/// Header naming the section a call originates from.
pub const LINK_SERVICE: HeaderName = HeaderName::from_static("x-link-service");

const BEARER_PREFIX: &str = "Bearer ";

/// Section and route table the gate enforces.
#[derive(Debug, Clone)]
pub struct GatePolicy {
    section: Arc<str>,
    routes: RouteTable,
    infer_route_actions: bool,
}

impl GatePolicy {
    /// Creates a policy that denies methods missing from `routes`.
    pub fn new(section: &str, routes: RouteTable) -> Self {
        Self {
            section: Arc::from(section),
            routes,
            infer_route_actions: false,
        }
    }

    /// Falls back to [`infer_policy`] for methods missing from the table.
    pub fn with_inferred_actions(mut self, infer: bool) -> Self {
        self.infer_route_actions = infer;
        self
    }

    /// Expected `x-link-service` value, also the permission section.
    #[inline]
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Returns whether the request path is on the allow-list.
    pub fn is_public(&self, path: &str) -> bool {
        MethodName::parse(path).is_some_and(|name| self.routes.is_public(&name.route()))
    }

    /// Resolves the policy of a method.
    pub fn resolve(&self, name: &MethodName<'_>) -> Option<RoutePolicy> {
        let route = name.route();
        if let Some(policy) = self.routes.get(&route) {
            return Some(policy);
        }

        if !self.infer_route_actions {
            return None;
        }

        let policy = infer_policy(name.method());
        tracing::warn!(
            target: TRACING_TARGET_GATE,
            route = %route,
            policy = ?policy,
            "route missing from the table, policy inferred from method name"
        );
        Some(policy)
    }
}

/// Extracts the token of an `authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_PREFIX)?.trim();
    (!token.is_empty()).then(|| SessionToken::new(token))
}

/// Gate middleware, installed with [`RouterGateExt::with_gate`].
pub async fn gate(
    State(policy): State<GatePolicy>,
    State(session_manager): State<SessionManager>,
    State(authorization_engine): State<AuthorizationEngine>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let path = request.uri().path().to_owned();
    if policy.is_public(&path) {
        return Ok(next.run(request).await);
    }

    let headers = request.headers();
    if !headers.contains_key(AUTHORIZATION) && !headers.contains_key(LINK_SERVICE) {
        tracing::debug!(target: TRACING_TARGET_GATE, path = %path, "request without metadata");
        return Err(ErrorKind::Unauthenticated.into_error());
    }

    let origin = headers.get(LINK_SERVICE).and_then(|v| v.to_str().ok());
    if origin != Some(policy.section()) {
        tracing::info!(
            target: TRACING_TARGET_GATE,
            path = %path,
            origin = origin.unwrap_or_default(),
            "request from an unexpected section"
        );
        return Err(ErrorKind::PermissionDenied.into_error());
    }

    let Some(token) = bearer_token(headers) else {
        tracing::debug!(target: TRACING_TARGET_GATE, path = %path, "missing bearer token");
        return Err(ErrorKind::Unauthenticated.into_error());
    };

    let identity = session_manager.verify(&token).await?;

    let Some(name) = MethodName::parse(&path) else {
        tracing::info!(target: TRACING_TARGET_GATE, path = %path, "malformed method name");
        return Err(ErrorKind::PermissionDenied.into_error());
    };

    match policy.resolve(&name) {
        Some(RoutePolicy::Public | RoutePolicy::SessionOnly) => {}
        Some(RoutePolicy::Require(action)) => {
            authorization_engine
                .authorize(identity.role_id, policy.section(), &name.route(), action)
                .await?;
        }
        None => {
            tracing::info!(
                target: TRACING_TARGET_GATE,
                route = %name.route(),
                "route not declared"
            );
            return Err(ErrorKind::PermissionDenied.with_resource(name.route()));
        }
    }

    tracing::debug!(
        target: TRACING_TARGET_GATE,
        route = %name.route(),
        user_id = identity.user_id,
        role_id = identity.role_id,
        "request admitted"
    );

    request.extensions_mut().insert::<Identity>(identity);
    Ok(next.run(request).await)
}

/// Extension trait for `axum::`[`Router`] to install the request gate.
pub trait RouterGateExt<S> {
    /// Runs [`gate`] in front of every route, including the fallback.
    fn with_gate(self, state: ServiceState) -> Self;
}

impl<S> RouterGateExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_gate(self, state: ServiceState) -> Self {
        self.layer(from_fn_with_state(state, gate))
    }
}
