//! Mapping of desired state and tracked identity onto an action.

use knob_identity::TrackedId;
use std::fmt;

/// What a reconcile call will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Nothing is tracked yet: create-or-update the desired setting.
    Create,
    /// The tracked identity addresses the desired setting: update its value.
    Update {
        /// Identity currently tracked.
        tracked: TrackedId,
    },
    /// The tracked identity addresses a different setting. Identity is
    /// immutable, so the old setting is reset before the new one is applied.
    Replace {
        /// Identity of the setting to reset.
        previous: TrackedId,
    },
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plan::Create => f.write_str("create"),
            Plan::Update { tracked } => write!(f, "update {tracked}"),
            Plan::Replace { previous } => write!(f, "replace {previous}"),
        }
    }
}

/// Result of a reconcile call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// The plan that was carried out.
    pub plan: Plan,
    /// Identity to track from now on.
    pub tracked: TrackedId,
}
