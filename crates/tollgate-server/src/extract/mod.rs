//! Request extractors with [`handler::Error`] rejections.
//!
//! - [`Json`] - JSON body, malformed input is `BadRequest`
//! - [`ValidateJson`] - JSON body checked with `validator`
//! - [`AuthIdentity`] - the caller the request gate verified
//!
//! [`handler::Error`]: crate::handler::Error

mod identity;
mod json;
mod validate_json;

pub use crate::extract::identity::AuthIdentity;
pub use crate::extract::json::Json;
pub use crate::extract::validate_json::ValidateJson;
