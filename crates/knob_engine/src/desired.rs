//! Desired state supplied by the caller.

use crate::error::{ReconcileError, ReconcileResult};
use knob_identity::SettingRef;
use serde::{Deserialize, Serialize};

/// The value a caller wants a remote setting to hold.
///
/// Supplied fresh on every call. `scope_id`, `parent_name` and `name`
/// form the setting's identity; the value is the only mutable part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    /// Leaf name of the setting.
    pub name: String,
    /// Container scope.
    pub scope_id: String,
    /// Parent resource.
    pub parent_name: String,
    /// Desired value.
    pub value: String,
}

impl DesiredState {
    /// Creates a desired state for `setting`.
    pub fn new(setting: SettingRef, value: impl Into<String>) -> Self {
        Self {
            name: setting.name,
            scope_id: setting.scope_id,
            parent_name: setting.parent_name,
            value: value.into(),
        }
    }

    /// Returns the identity triple.
    pub fn setting_ref(&self) -> SettingRef {
        SettingRef::new(&self.scope_id, &self.parent_name, &self.name)
    }

    /// Checks that the identity components are non-empty.
    pub fn validate(&self) -> ReconcileResult<()> {
        self.setting_ref()
            .validate()
            .map_err(|e| ReconcileError::InvalidDesiredState(e.to_string()))
    }
}
