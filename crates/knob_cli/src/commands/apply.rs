//! Apply command implementation.

use super::Engine;
use knob_engine::{CancellationToken, DesiredState, Plan};
use knob_identity::TrackedId;
use serde::Serialize;
use tracing::info;

/// Result of an apply.
#[derive(Debug, Serialize)]
pub struct ApplyReport {
    /// Action that was carried out (create, update or replace).
    pub action: &'static str,
    /// Identity to track from now on.
    pub id: TrackedId,
    /// Value the service reports after the apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Runs the apply command.
pub async fn run(
    engine: &Engine,
    desired: &DesiredState,
    tracked: Option<TrackedId>,
    cancel: &CancellationToken,
) -> Result<ApplyReport, Box<dyn std::error::Error>> {
    info!("Applying {} = {:?}", desired.setting_ref(), desired.value);

    let outcome = engine.reconcile(desired, tracked.as_ref(), cancel).await?;
    let state = engine.read(&outcome.tracked, cancel).await?;

    Ok(ApplyReport {
        action: action_name(&outcome.plan),
        id: outcome.tracked,
        value: state.map(|state| state.value),
    })
}

/// Short name of a plan's action.
pub fn action_name(plan: &Plan) -> &'static str {
    match plan {
        Plan::Create => "create",
        Plan::Update { .. } => "update",
        Plan::Replace { .. } => "replace",
    }
}
