//! Conversion of credential and permission store failures.
//!
//! Every database failure reaches the caller as an internal error. The detail
//! only goes to the logs.

use tollgate_postgres::PgError;

use crate::handler::{Error, ErrorKind};

/// Tracing target for database failures surfaced to handlers.
const TRACING_TARGET: &str = "tollgate_server::handler::postgres";

impl From<PgError> for Error<'static> {
    fn from(error: PgError) -> Self {
        match error {
            PgError::Config(ref reason) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    reason = %reason,
                    "database configuration error"
                );
            }
            PgError::Timeout(timeout) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    timeout = ?timeout,
                    "database pool timeout"
                );
            }
            PgError::Connection(ref connection_error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %connection_error,
                    "database connection error"
                );
            }
            PgError::Migration(ref migration_error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %migration_error,
                    "database migration error"
                );
            }
            PgError::Query(ref query_error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    constraint = error.constraint(),
                    error = %query_error,
                    "query error"
                );
            }
            PgError::Unexpected(ref unexpected_error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %unexpected_error,
                    "unexpected database error"
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
    fn database_errors_are_internal() {
        let error: Error = PgError::Unexpected("pool closed".into()).into();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        assert_eq!(error.context(), None);
    }
}
