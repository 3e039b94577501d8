//! Plan command implementation.

use super::apply::action_name;
use super::Engine;
use knob_engine::{DesiredState, Plan};
use knob_identity::TrackedId;
use serde::Serialize;

/// What an apply would do.
#[derive(Debug, Serialize)]
pub struct PlanReport {
    /// Planned action.
    pub action: &'static str,
    /// Setting that would be reset first, for a replacement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resets: Option<TrackedId>,
}

/// Runs the plan command.
pub fn run(
    engine: &Engine,
    desired: &DesiredState,
    tracked: Option<TrackedId>,
) -> Result<PlanReport, Box<dyn std::error::Error>> {
    let plan = engine.plan(desired, tracked.as_ref())?;
    let resets = match &plan {
        Plan::Replace { previous } => Some(previous.clone()),
        _ => None,
    };

    Ok(PlanReport {
        action: action_name(&plan),
        resets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{engine, shared_buffers};
    use knob_identity::{IdentityCodec, SettingRef};

    #[test]
    fn plan_reports_replacement() {
        let (_remote, engine) = engine();
        let previous = engine
            .codec()
            .encode(&SettingRef::new("rg1", "server0", "shared_buffers"))
            .unwrap();

        let report = run(
            &engine,
            &DesiredState::new(shared_buffers(), "1GB"),
            Some(previous.clone()),
        )
        .unwrap();

        assert_eq!(report.action, "replace");
        assert_eq!(report.resets, Some(previous));
    }

    #[test]
    fn plan_rejects_garbage_identity() {
        let (_remote, engine) = engine();
        let result = run(
            &engine,
            &DesiredState::new(shared_buffers(), "1GB"),
            Some(TrackedId::new("garbage")),
        );
        assert!(result.is_err());
    }
}
