//! JSON extractor that also runs `validator` rules.

use axum::extract::{FromRequest, Request};
use derive_more::{Deref, DerefMut, From};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use super::Json;
use crate::handler::{Error, ErrorKind};

/// Deserializes like [`Json`] and then calls [`Validate::validate`].
///
/// Validation failures are rejected with [`ErrorKind::BadRequest`] before the
/// handler, and therefore any store, is reached.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct ValidateJson<T>(pub T);

impl<T> ValidateJson<T> {
    /// Returns the inner validated value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for ValidateJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = <Json<T> as FromRequest<S>>::from_request(req, state).await?;
        data.validate()?;
        Ok(Self(data))
    }
}

fn format_validation_error(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return format!("Field '{field}': {message}");
    }

    match error.code.as_ref() {
        "required" => format!("Field '{field}' is required"),
        "email" => format!("Field '{field}' must be a valid email address"),
        "length" => {
            let bound = |key: &str| error.params.get(key).and_then(serde_json::Value::as_u64);
            match (bound("min"), bound("max")) {
                (Some(min), Some(max)) => {
                    format!("Field '{field}' must be between {min} and {max} characters long")
                }
                (Some(min), None) => format!("Field '{field}' must be at least {min} characters long"),
                (None, Some(max)) => format!("Field '{field}' must be at most {max} characters long"),
                (None, None) => format!("Field '{field}' has invalid length"),
            }
        }
        "range" => format!("Field '{field}' is out of range"),
        code => format!("Field '{field}' failed validation: {code}"),
    }
}

impl From<ValidationErrors> for Error<'static> {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, field_errors)| {
                field_errors
                    .iter()
                    .map(move |error| format_validation_error(field, error))
            })
            .collect();
        messages.sort();

        tracing::debug!(errors = ?errors.field_errors(), "request validation failed");

        let message = match messages.as_slice() {
            [] => "Validation failed".to_string(),
            _ => messages.join(". "),
        };

        ErrorKind::BadRequest
            .with_message(message)
            .with_resource("request")
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Signup {
        #[validate(email)]
        email: String,
        #[validate(length(min = 8, max = 64))]
        password: String,
    }

    #[test]
    fn validation_errors_become_bad_request() {
        let signup = Signup {
            email: "not-an-email".to_owned(),
            password: "short".to_owned(),
        };

        let error: Error<'static> = signup.validate().unwrap_err().into();
        assert_eq!(error.kind(), ErrorKind::BadRequest);

        let message = error.message().unwrap_or_default();
        assert!(message.contains("'email' must be a valid email address"));
        assert!(message.contains("'password' must be between 8 and 64"));
    }
}
