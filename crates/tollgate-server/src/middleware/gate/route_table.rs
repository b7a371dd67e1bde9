use std::collections::HashMap;
use std::sync::Arc;

use crate::service::Action;

/// What the gate requires before a method may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePolicy {
    /// Reachable before authentication (the allow-list).
    Public,
    /// Requires a valid session but no permission rule.
    SessionOnly,
    /// Requires a session whose role is granted `Action` on the route.
    Require(Action),
}

/// Static mapping of `<Service>/<Method>` routes to their [`RoutePolicy`].
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Arc<HashMap<String, RoutePolicy>>,
}

impl RouteTable {
    /// Creates a table from `(route, policy)` pairs.
    pub fn new<I, R>(routes: I) -> Self
    where
        I: IntoIterator<Item = (R, RoutePolicy)>,
        R: Into<String>,
    {
        let routes = routes
            .into_iter()
            .map(|(route, policy)| (route.into(), policy))
            .collect();

        Self {
            routes: Arc::new(routes),
        }
    }

    /// Returns the declared policy of `route`.
    #[inline]
    pub fn get(&self, route: &str) -> Option<RoutePolicy> {
        self.routes.get(route).copied()
    }

    /// Returns whether `route` is declared [`RoutePolicy::Public`].
    #[inline]
    pub fn is_public(&self, route: &str) -> bool {
        self.get(route) == Some(RoutePolicy::Public)
    }

    /// Number of declared routes.
    #[inline]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RouteTable {
    /// Policies of every method the server exposes.
    fn default() -> Self {
        Self::new([
            ("AuthService/Login", RoutePolicy::Public),
            ("AuthService/Register", RoutePolicy::Public),
            ("AuthService/Logout", RoutePolicy::SessionOnly),
            ("UserService/ListUsers", RoutePolicy::Require(Action::Read)),
            ("UserService/CreateUser", RoutePolicy::Require(Action::Create)),
            ("UserService/UpdateUser", RoutePolicy::Require(Action::Update)),
            ("UserService/DeleteUser", RoutePolicy::Require(Action::Delete)),
        ])
    }
}

/// Derives a policy from the method name alone.
///
/// Matching is a case-insensitive prefix test: `get` reads, `create` creates,
/// `update` updates, `delete` deletes. `logout` needs only a session. Anything
/// else is treated as a read.
pub fn infer_policy(method: &str) -> RoutePolicy {
    let method = method.to_ascii_lowercase();

    if method.starts_with("logout") {
        return RoutePolicy::SessionOnly;
    }

    let action = [
        ("get", Action::Read),
        ("create", Action::Create),
        ("update", Action::Update),
        ("delete", Action::Delete),
    ]
    .into_iter()
    .find_map(|(prefix, action)| method.starts_with(prefix).then_some(action))
    .unwrap_or(Action::Read);

    RoutePolicy::Require(action)
}
