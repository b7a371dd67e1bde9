use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Envelope of every successful call: `{ "status": true, "message": .., "data": .. }`.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply<T = ()> {
    pub status: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl Reply {
    /// Creates a reply without a payload.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: None,
        }
    }
}

impl<T> Reply<T> {
    /// Creates a reply carrying `data`.
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl<T> IntoResponse for Reply<T>
where
    T: Serialize,
{
    #[inline]
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
