use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use derive_more::{Deref, From};

use crate::handler::{Error, ErrorKind};
use crate::service::Identity;

/// The caller verified by the request gate.
///
/// Only usable on routes behind the gate; elsewhere extraction fails with
/// [`ErrorKind::InternalServerError`].
#[must_use]
#[derive(Debug, Clone, Deref, From)]
pub struct AuthIdentity(pub Identity);

impl AuthIdentity {
    /// Returns the inner identity.
    #[inline]
    pub fn into_inner(self) -> Identity {
        self.0
    }
}

impl<S> FromRequestParts<S> for AuthIdentity
where
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts.extensions.get::<Identity>().cloned().ok_or_else(|| {
            tracing::error!(
                target: crate::TRACING_TARGET_GATE,
                path = %parts.uri.path(),
                "identity extracted on a route the gate does not cover"
            );
            ErrorKind::InternalServerError
                .with_message("user authentication data not found in context")
        })?;

        Ok(Self(identity))
    }
}
