//! Setting addresses and tracked identities.

use crate::error::{IdentityError, IdentityResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of a single remote setting.
///
/// The remote service addresses settings by this triple, so it is
/// immutable once a setting is tracked. Changing any component means
/// addressing a different setting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SettingRef {
    /// Container scope (e.g. a resource group).
    pub scope_id: String,
    /// Parent resource holding the setting (e.g. a server).
    pub parent_name: String,
    /// Leaf name of the setting.
    pub name: String,
}

impl SettingRef {
    /// Creates a new setting address.
    pub fn new(
        scope_id: impl Into<String>,
        parent_name: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            scope_id: scope_id.into(),
            parent_name: parent_name.into(),
            name: name.into(),
        }
    }

    /// Checks that no component is empty.
    pub fn validate(&self) -> IdentityResult<()> {
        for (component, value) in [
            ("scope_id", &self.scope_id),
            ("parent_name", &self.parent_name),
            ("name", &self.name),
        ] {
            if value.is_empty() {
                return Err(IdentityError::EmptyComponent { component });
            }
        }
        Ok(())
    }
}

impl fmt::Display for SettingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.scope_id, self.parent_name, self.name)
    }
}

/// Opaque, persisted handle to a tracked setting.
///
/// Produced by an [`IdentityCodec`](crate::IdentityCodec) after a
/// successful apply or import. The caller stores it and hands it back
/// for reads and resets.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackedId(String);

impl TrackedId {
    /// Wraps a raw identity string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw identity string.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the handle, returning the raw string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for TrackedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrackedId({})", self.0)
    }
}

impl fmt::Display for TrackedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TrackedId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for TrackedId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl AsRef<str> for TrackedId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_components() {
        assert!(SettingRef::new("rg1", "server1", "shared_buffers")
            .validate()
            .is_ok());

        let err = SettingRef::new("", "server1", "shared_buffers")
            .validate()
            .unwrap_err();
        assert_eq!(err, IdentityError::EmptyComponent { component: "scope_id" });

        let err = SettingRef::new("rg1", "", "x").validate().unwrap_err();
        assert_eq!(
            err,
            IdentityError::EmptyComponent {
                component: "parent_name"
            }
        );

        let err = SettingRef::new("rg1", "server1", "").validate().unwrap_err();
        assert_eq!(err, IdentityError::EmptyComponent { component: "name" });
    }

    #[test]
    fn display_formats() {
        let setting = SettingRef::new("rg1", "server1", "work_mem");
        assert_eq!(setting.to_string(), "rg1/server1/work_mem");

        let id = TrackedId::new("/a/b");
        assert_eq!(id.to_string(), "/a/b");
        assert_eq!(format!("{id:?}"), "TrackedId(/a/b)");
    }

    #[test]
    fn tracked_id_serializes_as_plain_string() {
        let id = TrackedId::from("/resourceGroups/rg1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"/resourceGroups/rg1\"");

        let back: TrackedId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
