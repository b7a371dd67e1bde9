//! Login session payload.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Identity snapshot stored for a login session.
///
/// Taken at login, after the last access time has been recorded. The
/// credential hash is never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub role_id: i32,
    pub last_access: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_payload_is_a_serialization_error() {
        let err = serde_json::from_str::<SessionData>(r#"{"userId":"x"}"#).unwrap_err();
        assert!(crate::Error::from(err).is_serialization());
    }
}
