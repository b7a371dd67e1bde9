//! Role based permission checks.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tollgate_postgres::model::RoleRight;

use crate::TRACING_TARGET_AUTHORIZATION;
use crate::handler::{ErrorKind, Result};
use crate::service::{Deadline, PermissionStore};

/// The permission dimension being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumIter, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    /// Returns whether `rule` grants this action.
    #[inline]
    pub fn is_granted_by(self, rule: &RoleRight) -> bool {
        match self {
            Self::Create => rule.r_create,
            Self::Read => rule.r_read,
            Self::Update => rule.r_update,
            Self::Delete => rule.r_delete,
        }
    }
}

/// Decides whether a role may perform an action on a route.
///
/// Rules come from the [`PermissionStore`], one per `(role, section, route)`.
/// A missing rule denies every action.
#[derive(Clone)]
pub struct AuthorizationEngine {
    permissions: Arc<dyn PermissionStore>,
    deadline: Deadline,
}

impl AuthorizationEngine {
    /// Creates a new [`AuthorizationEngine`].
    pub fn new(permissions: Arc<dyn PermissionStore>, deadline: Deadline) -> Self {
        Self {
            permissions,
            deadline,
        }
    }

    /// Succeeds if `role_id` may perform `action` on `route` in `section`.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::PermissionDenied`] if no rule exists or its flag is unset.
    /// - [`ErrorKind::Cancelled`] if the lookup exceeds its deadline.
    /// - [`ErrorKind::InternalServerError`] if the store fails.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_AUTHORIZATION)]
    pub async fn authorize(
        &self,
        role_id: i32,
        section: &str,
        route: &str,
        action: Action,
    ) -> Result<()> {
        let rule = self
            .deadline
            .run(
                "find_role_right",
                self.permissions.find_role_right(role_id, section, route),
            )
            .await?
            .map_err(|error| {
                tracing::error!(
                    target: TRACING_TARGET_AUTHORIZATION,
                    operation = "find_role_right",
                    role_id,
                    section,
                    route,
                    error = %error,
                    "permission lookup failed"
                );
                ErrorKind::InternalServerError.into_error()
            })?;

        match rule {
            Some(rule) if action.is_granted_by(&rule) => Ok(()),
            Some(_) => {
                tracing::info!(
                    target: TRACING_TARGET_AUTHORIZATION,
                    role_id,
                    section,
                    route,
                    action = %action,
                    "action not granted"
                );
                Err(ErrorKind::PermissionDenied.with_resource(route.to_owned()))
            }
            None => {
                tracing::info!(
                    target: TRACING_TARGET_AUTHORIZATION,
                    role_id,
                    section,
                    route,
                    "no rule for route"
                );
                Err(ErrorKind::PermissionDenied.with_resource(route.to_owned()))
            }
        }
    }
}

impl fmt::Debug for AuthorizationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationEngine")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
