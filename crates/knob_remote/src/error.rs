//! Error types for the remote boundary.

use thiserror::Error;

/// Result type for remote calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors reported by a remote configuration service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The addressed setting or its parent does not exist.
    #[error("not found: {resource}")]
    NotFound {
        /// Description of the missing resource.
        resource: String,
    },

    /// Network, authentication or service-side failure.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// HTTP-style status code, when the service reported one.
        status: Option<u16>,
    },

    /// An asynchronous operation finished in a failed state.
    #[error("operation {operation_id} failed: {message}")]
    OperationFailed {
        /// Identifier of the failed operation.
        operation_id: String,
        /// Failure reported by the service.
        message: String,
    },

    /// The service answered with a response the client cannot use.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Creates a not-found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a transport error without a status code.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
        }
    }

    /// Creates a transport error carrying a status code.
    pub fn transport_status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Returns true if the service reported the resource as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_classification() {
        assert!(RemoteError::not_found("server s1").is_not_found());
        assert!(!RemoteError::transport("connection reset").is_not_found());
        assert!(!RemoteError::transport_status(404, "gateway said so").is_not_found());
        assert!(!RemoteError::Malformed("missing id".into()).is_not_found());
    }

    #[test]
    fn error_display() {
        let err = RemoteError::OperationFailed {
            operation_id: "op-1".into(),
            message: "server restarting".into(),
        };
        assert_eq!(err.to_string(), "operation op-1 failed: server restarting");

        let err = RemoteError::transport_status(503, "unavailable");
        assert_eq!(err.to_string(), "transport error: unavailable");
    }
}
