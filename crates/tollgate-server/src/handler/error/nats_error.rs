//! Conversion of session cache failures.

use super::http_error::{Error as HttpError, ErrorKind};

/// Tracing target for cache failures surfaced to handlers.
const TRACING_TARGET: &str = "tollgate_server::handler::nats";

impl From<tollgate_nats::Error> for HttpError<'static> {
    fn from(nats_error: tollgate_nats::Error) -> Self {
        match nats_error {
            tollgate_nats::Error::Serialization(ref error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    "malformed cache payload"
                );
            }
            tollgate_nats::Error::InvalidKey { ref reason, .. } => {
                tracing::error!(
                    target: TRACING_TARGET,
                    reason = %reason,
                    "invalid cache key"
                );
            }
            ref other => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %other,
                    "cache operation failed"
                );
            }
        }

        ErrorKind::InternalServerError.into_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_errors_are_internal() {
        let error: HttpError = tollgate_nats::Error::operation("kv_get", "no responders").into();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
    }
}
