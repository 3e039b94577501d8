//! Remote setting representation.

use serde::{Deserialize, Serialize};

/// A setting as reported by the remote service.
///
/// Read-only from the reconciler's point of view and never cached
/// across calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Canonical identity issued by the service. Some services omit it
    /// from partial responses.
    pub id: Option<String>,
    /// Leaf name of the setting.
    pub name: String,
    /// Value currently in effect.
    pub value: String,
    /// System-defined baseline the setting resets to.
    pub default_value: String,
}
