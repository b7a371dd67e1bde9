use jiff::Timestamp;
use tollgate_nats::kv::SessionData;

use crate::service::SessionToken;

/// The verified caller of a request.
///
/// Built from the session snapshot taken at login, together with the token
/// that was presented, so the session can be ended later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub role_id: i32,
    /// Login time recorded for this session.
    pub last_access: Option<Timestamp>,
    /// Token the caller authenticated with.
    pub token: SessionToken,
}

impl Identity {
    /// Combines a cached session with the token it was stored under.
    pub fn from_session(session: SessionData, token: SessionToken) -> Self {
        Self {
            user_id: session.user_id,
            name: session.name,
            email: session.email,
            role_id: session.role_id,
            last_access: session.last_access,
            token,
        }
    }
}
