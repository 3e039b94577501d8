//! Error types for the reconciliation engine.

use knob_identity::{IdentityError, SettingRef};
use knob_remote::RemoteError;
use std::fmt;
use thiserror::Error;

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// The lifecycle operation being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Create or update.
    Apply,
    /// Refresh from the remote service.
    Read,
    /// Reset to the remote default.
    Reset,
    /// Adopt an existing setting.
    Import,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Apply => "apply",
            Operation::Read => "read",
            Operation::Reset => "reset",
            Operation::Import => "import",
        })
    }
}

/// Errors that can occur while reconciling a setting.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The tracked identity could not be decoded.
    #[error("invalid identity: {0}")]
    Identity(#[from] IdentityError),

    /// The desired state violates a precondition.
    #[error("invalid desired state: {0}")]
    InvalidDesiredState(String),

    /// Reading remote state needed to make a decision failed.
    #[error("{operation} of {setting}: reading remote state failed: {source}")]
    StateRead {
        /// Operation attempted.
        operation: Operation,
        /// Setting addressed.
        setting: SettingRef,
        /// Underlying remote error.
        source: RemoteError,
    },

    /// Submitting or completing a remote mutation failed.
    #[error("{operation} of {setting}: remote operation failed: {source}")]
    RemoteOperation {
        /// Operation attempted.
        operation: Operation,
        /// Setting addressed.
        setting: SettingRef,
        /// Underlying remote error.
        source: RemoteError,
    },

    /// The caller cancelled the operation.
    #[error("{operation} of {setting} cancelled")]
    Cancelled {
        /// Operation attempted.
        operation: Operation,
        /// Setting addressed.
        setting: SettingRef,
    },
}

impl ReconcileError {
    /// Returns true for failures reading remote state.
    pub fn is_state_read(&self) -> bool {
        matches!(self, ReconcileError::StateRead { .. })
    }

    /// Returns true for failures of a remote mutation.
    pub fn is_remote_operation(&self) -> bool {
        matches!(self, ReconcileError::RemoteOperation { .. })
    }

    /// Returns true if the caller cancelled the operation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReconcileError::Cancelled { .. })
    }

    /// Returns the remote error behind this failure, if any.
    pub fn remote_source(&self) -> Option<&RemoteError> {
        match self {
            ReconcileError::StateRead { source, .. }
            | ReconcileError::RemoteOperation { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setting() -> SettingRef {
        SettingRef::new("rg1", "server1", "shared_buffers")
    }

    #[test]
    fn error_display_carries_context() {
        let err = ReconcileError::StateRead {
            operation: Operation::Apply,
            setting: setting(),
            source: RemoteError::not_found("configuration rg1/server1/shared_buffers"),
        };
        let text = err.to_string();
        assert!(text.starts_with("apply of rg1/server1/shared_buffers"));
        assert!(text.contains("not found"));

        let err = ReconcileError::Cancelled {
            operation: Operation::Reset,
            setting: setting(),
        };
        assert_eq!(err.to_string(), "reset of rg1/server1/shared_buffers cancelled");
    }

    #[test]
    fn classification() {
        let err = ReconcileError::RemoteOperation {
            operation: Operation::Apply,
            setting: setting(),
            source: RemoteError::transport("reset by peer"),
        };
        assert!(err.is_remote_operation());
        assert!(!err.is_state_read());
        assert_eq!(
            err.remote_source(),
            Some(&RemoteError::transport("reset by peer"))
        );

        let err = ReconcileError::from(IdentityError::EmptyComponent { component: "name" });
        assert!(err.remote_source().is_none());
        assert!(!err.is_cancelled());
    }
}
