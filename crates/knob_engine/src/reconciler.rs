//! The reconciler.

use crate::config::ReconcilerConfig;
use crate::desired::DesiredState;
use crate::error::{Operation, ReconcileError, ReconcileResult};
use crate::plan::{Outcome, Plan};
use knob_identity::{IdentityCodec, ResourcePathCodec, SettingRef, TrackedId};
use knob_remote::{RemoteClient, RemoteError, RemoteObject};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A setting adopted through [`Reconciler::import`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Imported {
    /// Canonical identity to track.
    pub tracked: TrackedId,
    /// State currently held by the service.
    pub state: DesiredState,
}

/// Drives a remote setting toward a desired value and reflects the
/// service's state back.
///
/// Holds no mutable state; calls are independent and may run
/// concurrently. Concurrent calls against the same setting race, and the
/// service decides the final value.
pub struct Reconciler<C: RemoteClient, I: IdentityCodec = ResourcePathCodec> {
    client: Arc<C>,
    codec: I,
    config: ReconcilerConfig,
}

impl<C: RemoteClient> Reconciler<C> {
    /// Creates a reconciler using the resource-path identity codec.
    pub fn new(client: C, config: ReconcilerConfig) -> Self {
        Self::with_codec(client, ResourcePathCodec::default(), config)
    }
}

impl<C: RemoteClient, I: IdentityCodec> Reconciler<C, I> {
    /// Creates a reconciler with a custom identity codec.
    pub fn with_codec(client: C, codec: I, config: ReconcilerConfig) -> Self {
        Self {
            client: Arc::new(client),
            codec,
            config,
        }
    }

    /// Returns the identity codec.
    pub fn codec(&self) -> &I {
        &self.codec
    }

    /// Creates or updates the setting to the desired value.
    ///
    /// Waits for the remote operation to finish, then reads the setting
    /// back to obtain its canonical identity. Used for both create and
    /// update; the behavior is the same either way.
    pub async fn apply(
        &self,
        desired: &DesiredState,
        cancel: &CancellationToken,
    ) -> ReconcileResult<TrackedId> {
        desired.validate()?;
        let setting = desired.setting_ref();
        let op = Operation::Apply;

        info!(%setting, value = %desired.value, "applying configuration");

        let mut handle = until_cancelled(
            cancel,
            op,
            &setting,
            self.client.create_or_update(&setting, &desired.value),
        )
        .await?
        .map_err(|source| remote_operation(op, &setting, source))?;

        until_cancelled(cancel, op, &setting, handle.wait(self.config.poll_interval))
            .await?
            .map_err(|source| remote_operation(op, &setting, source))?;

        let object = until_cancelled(cancel, op, &setting, self.client.get(&setting))
            .await?
            .map_err(|source| state_read(op, &setting, source))?;

        let tracked = self.confirm_identity(&setting, &object)?;

        if object.value != desired.value {
            warn!(
                %setting,
                desired = %desired.value,
                applied = %object.value,
                "service reports a different value than applied"
            );
        }

        info!(%setting, id = %tracked, "configuration applied");
        Ok(tracked)
    }

    /// Reads the tracked setting.
    ///
    /// Returns `None` if the setting no longer exists; the caller should
    /// stop tracking it.
    pub async fn read(
        &self,
        tracked: &TrackedId,
        cancel: &CancellationToken,
    ) -> ReconcileResult<Option<DesiredState>> {
        let setting = self.codec.decode(tracked.as_str())?;
        self.read_setting(Operation::Read, setting, cancel).await
    }

    /// Adopts an existing setting by its raw identity.
    ///
    /// Returns `None` if the setting does not exist.
    pub async fn import(
        &self,
        raw_id: &str,
        cancel: &CancellationToken,
    ) -> ReconcileResult<Option<Imported>> {
        let setting = self.codec.decode(raw_id)?;
        let tracked = self.codec.encode(&setting)?;

        Ok(self
            .read_setting(Operation::Import, setting, cancel)
            .await?
            .map(|state| Imported { tracked, state }))
    }

    /// Resets the tracked setting to the default reported by the service.
    ///
    /// This is the lifecycle's delete: settings cannot be removed, only
    /// reset. A setting that is already gone counts as reset.
    pub async fn reset_to_default(
        &self,
        tracked: &TrackedId,
        cancel: &CancellationToken,
    ) -> ReconcileResult<()> {
        let setting = self.codec.decode(tracked.as_str())?;
        let op = Operation::Reset;

        let object = match until_cancelled(cancel, op, &setting, self.client.get(&setting)).await? {
            Ok(object) => object,
            Err(e) if e.is_not_found() => {
                warn!(%setting, "configuration not found, nothing to reset");
                return Ok(());
            }
            Err(source) => return Err(state_read(op, &setting, source)),
        };

        info!(%setting, default = %object.default_value, "resetting configuration to default");

        let submitted = until_cancelled(
            cancel,
            op,
            &setting,
            self.client.create_or_update(&setting, &object.default_value),
        )
        .await?;
        let mut handle = match submitted {
            Ok(handle) => handle,
            Err(e) if e.is_not_found() => {
                warn!(%setting, "configuration disappeared before reset was submitted");
                return Ok(());
            }
            Err(source) => return Err(remote_operation(op, &setting, source)),
        };

        match until_cancelled(cancel, op, &setting, handle.wait(self.config.poll_interval)).await? {
            Ok(()) => {
                info!(%setting, "configuration reset");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!(%setting, "configuration disappeared while reset was in flight");
                Ok(())
            }
            Err(source) => Err(remote_operation(op, &setting, source)),
        }
    }

    /// Decides what [`reconcile`](Self::reconcile) would do.
    pub fn plan(&self, desired: &DesiredState, tracked: Option<&TrackedId>) -> ReconcileResult<Plan> {
        desired.validate()?;

        let Some(tracked) = tracked else {
            return Ok(Plan::Create);
        };

        let previous = self.codec.decode(tracked.as_str())?;
        if previous == desired.setting_ref() {
            Ok(Plan::Update {
                tracked: tracked.clone(),
            })
        } else {
            Ok(Plan::Replace {
                previous: tracked.clone(),
            })
        }
    }

    /// Plans and carries out one reconciliation.
    ///
    /// A replacement resets the previously tracked setting before applying
    /// the new one. If the apply then fails, the old setting stays reset.
    pub async fn reconcile(
        &self,
        desired: &DesiredState,
        tracked: Option<&TrackedId>,
        cancel: &CancellationToken,
    ) -> ReconcileResult<Outcome> {
        let plan = self.plan(desired, tracked)?;
        debug!(setting = %desired.setting_ref(), %plan, "planned reconciliation");

        if let Plan::Replace { previous } = &plan {
            self.reset_to_default(previous, cancel).await?;
        }

        let tracked = self.apply(desired, cancel).await?;
        Ok(Outcome { plan, tracked })
    }

    async fn read_setting(
        &self,
        op: Operation,
        setting: SettingRef,
        cancel: &CancellationToken,
    ) -> ReconcileResult<Option<DesiredState>> {
        debug!(%setting, "reading configuration");

        match until_cancelled(cancel, op, &setting, self.client.get(&setting)).await? {
            Ok(object) => Ok(Some(DesiredState {
                name: setting.name,
                scope_id: setting.scope_id,
                parent_name: setting.parent_name,
                value: object.value,
            })),
            Err(e) if e.is_not_found() => {
                warn!(%setting, "configuration was not found");
                Ok(None)
            }
            Err(source) => Err(state_read(op, &setting, source)),
        }
    }

    /// Derives the tracked identity from a confirming read.
    fn confirm_identity(
        &self,
        setting: &SettingRef,
        object: &RemoteObject,
    ) -> ReconcileResult<TrackedId> {
        let op = Operation::Apply;

        let raw = object.id.as_deref().ok_or_else(|| {
            state_read(
                op,
                setting,
                RemoteError::Malformed(format!("cannot read ID of configuration {setting}")),
            )
        })?;

        let confirmed = self.codec.decode(raw).map_err(|e| {
            state_read(
                op,
                setting,
                RemoteError::Malformed(format!("unreadable ID `{raw}`: {e}")),
            )
        })?;

        if &confirmed != setting {
            return Err(state_read(
                op,
                setting,
                RemoteError::Malformed(format!("ID `{raw}` addresses {confirmed}")),
            ));
        }

        Ok(self.codec.encode(&confirmed)?)
    }
}

/// Races `fut` against the caller's cancellation token.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    operation: Operation,
    setting: &SettingRef,
    fut: impl Future<Output = T>,
) -> ReconcileResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!(%setting, %operation, "cancelled by caller");
            Err(ReconcileError::Cancelled {
                operation,
                setting: setting.clone(),
            })
        }
        out = fut => Ok(out),
    }
}

fn state_read(operation: Operation, setting: &SettingRef, source: RemoteError) -> ReconcileError {
    ReconcileError::StateRead {
        operation,
        setting: setting.clone(),
        source,
    }
}

fn remote_operation(
    operation: Operation,
    setting: &SettingRef,
    source: RemoteError,
) -> ReconcileError {
    ReconcileError::RemoteOperation {
        operation,
        setting: setting.clone(),
        source,
    }
}
