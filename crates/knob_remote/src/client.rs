//! Remote client abstraction.

use crate::error::RemoteResult;
use crate::object::RemoteObject;
use async_trait::async_trait;
use knob_identity::SettingRef;
use std::time::Duration;
use tracing::debug;

/// State of an in-flight remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    /// The service is still applying the mutation.
    InProgress,
    /// The mutation has been applied.
    Succeeded,
}

impl OperationStatus {
    /// Returns true if the operation has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Succeeded)
    }
}

/// A remote mutation that completes after a delay.
///
/// Returning from [`RemoteClient::create_or_update`] does not mean the
/// mutation has been applied; callers must drive the handle to a terminal
/// state first. A failed operation is reported as an error from
/// [`poll`](OperationHandle::poll).
#[async_trait]
pub trait OperationHandle: Send {
    /// Identifier the service assigned to this operation.
    fn id(&self) -> &str;

    /// Asks the service for the operation's current state.
    async fn poll(&mut self) -> RemoteResult<OperationStatus>;

    /// Polls until the operation finishes, sleeping `poll_interval`
    /// between polls.
    ///
    /// Has no timeout of its own. Dropping the returned future abandons
    /// the wait without affecting the remote operation.
    async fn wait(&mut self, poll_interval: Duration) -> RemoteResult<()> {
        loop {
            if self.poll().await?.is_terminal() {
                return Ok(());
            }
            debug!(operation = self.id(), "operation still in progress");
            tokio::time::sleep(poll_interval).await;
        }
    }
}

/// A client for a remote configuration service.
///
/// Implementations own authentication and transport; the reconciler only
/// sees this interface.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Submits a create-or-update of `setting` to `value`.
    ///
    /// Returns a handle to the asynchronous operation carrying out the
    /// change.
    async fn create_or_update(
        &self,
        setting: &SettingRef,
        value: &str,
    ) -> RemoteResult<Box<dyn OperationHandle>>;

    /// Reads the current state of `setting`.
    ///
    /// Reports [`RemoteError::NotFound`](crate::RemoteError::NotFound)
    /// when the setting or its parent does not exist.
    async fn get(&self, setting: &SettingRef) -> RemoteResult<RemoteObject>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;

    struct ScriptedHandle {
        remaining: Vec<RemoteResult<OperationStatus>>,
        polls: usize,
    }

    #[async_trait]
    impl OperationHandle for ScriptedHandle {
        fn id(&self) -> &str {
            "scripted"
        }

        async fn poll(&mut self) -> RemoteResult<OperationStatus> {
            self.polls += 1;
            self.remaining.remove(0)
        }
    }

    #[tokio::test]
    async fn wait_polls_until_terminal() {
        let mut handle = ScriptedHandle {
            remaining: vec![
                Ok(OperationStatus::InProgress),
                Ok(OperationStatus::InProgress),
                Ok(OperationStatus::Succeeded),
            ],
            polls: 0,
        };

        handle.wait(Duration::from_millis(1)).await.unwrap();
        assert_eq!(handle.polls, 3);
    }

    #[tokio::test]
    async fn wait_surfaces_failure() {
        let mut handle = ScriptedHandle {
            remaining: vec![
                Ok(OperationStatus::InProgress),
                Err(RemoteError::transport("lost")),
            ],
            polls: 0,
        };

        let err = handle.wait(Duration::from_millis(1)).await.unwrap_err();
        assert_eq!(err, RemoteError::transport("lost"));
        assert_eq!(handle.polls, 2);
    }

    #[test]
    fn terminal_status() {
        assert!(OperationStatus::Succeeded.is_terminal());
        assert!(!OperationStatus::InProgress.is_terminal());
    }
}
