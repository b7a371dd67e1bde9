//! Server error types with recovery suggestions.

use std::io;

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Error raised while binding or running the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address.
    #[error("Failed to bind to {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Runtime server error.
    #[error("Runtime error: {0}")]
    Runtime(#[source] io::Error),
}

impl ServerError {
    /// Creates a bind error with address context.
    pub fn bind_error(address: impl ToString, source: io::Error) -> Self {
        Self::BindError {
            address: address.to_string(),
            source,
        }
    }

    /// Returns the underlying IO error kind.
    pub fn io_kind(&self) -> io::ErrorKind {
        match self {
            Self::BindError { source, .. } => source.kind(),
            Self::Runtime(err) => err.kind(),
        }
    }

    /// Provides a human-readable suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::BindError { source, .. } => match source.kind() {
                io::ErrorKind::PermissionDenied => {
                    Some("Try using a port above 1024 or run with appropriate privileges")
                }
                io::ErrorKind::AddrInUse => Some(
                    "The port is already in use. Try a different port or stop the conflicting service",
                ),
                io::ErrorKind::AddrNotAvailable => {
                    Some("The address is not available. Check network interface configuration")
                }
                _ => Some("Check network configuration and firewall settings"),
            },
            Self::Runtime(err) => match err.kind() {
                io::ErrorKind::PermissionDenied => Some("Check file and network permissions"),
                io::ErrorKind::Interrupted => Some("The operation was interrupted, you may retry"),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_errors_always_have_suggestions() {
        for kind in [
            io::ErrorKind::PermissionDenied,
            io::ErrorKind::AddrInUse,
            io::ErrorKind::Other,
        ] {
            let err = ServerError::bind_error("127.0.0.1:80", io::Error::new(kind, "test"));
            assert!(err.suggestion().is_some());
            assert_eq!(err.io_kind(), kind);
        }
    }

    #[test]
    fn bind_error_names_the_address() {
        let err = ServerError::bind_error("127.0.0.1:3000", io::Error::other("test"));
        assert!(err.to_string().contains("127.0.0.1:3000"));
    }

    #[test]
    fn unknown_runtime_errors_have_no_suggestion() {
        let err = ServerError::Runtime(io::Error::other("test"));
        assert!(err.suggestion().is_none());
    }
}
