//! Identity codecs.
//!
//! The default codec produces resource-path identities of the form
//!
//! ```text
//! /resourceGroups/{scope}/providers/{namespace}/servers/{parent}/configurations/{name}
//! ```
//!
//! Path values are percent-encoded, so any non-empty component survives a
//! round trip.

use crate::error::{IdentityError, IdentityResult};
use crate::setting::{SettingRef, TrackedId};
use std::collections::BTreeMap;

const PROVIDERS_KEY: &str = "providers";

/// Converts between a [`SettingRef`] triple and its persisted [`TrackedId`].
pub trait IdentityCodec: Send + Sync {
    /// Encodes a triple. Fails only when a component is empty.
    fn encode(&self, setting: &SettingRef) -> IdentityResult<TrackedId>;

    /// Decodes a raw identity string back into its triple.
    fn decode(&self, id: &str) -> IdentityResult<SettingRef>;
}

/// Resource-path identity codec.
///
/// Decoding tolerates key/value pairs the codec does not know about
/// (for example a leading `subscriptions/{id}` pair) so identities issued
/// by the remote service can be read as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePathCodec {
    scope_key: String,
    parent_key: String,
    leaf_key: String,
    provider: Option<String>,
}

impl ResourcePathCodec {
    /// Creates a codec with custom segment keys and no provider namespace.
    ///
    /// Keys must be non-empty, distinct, free of `/`, and must not be
    /// `providers`; otherwise encoded identities would not decode.
    pub fn new(
        scope_key: impl Into<String>,
        parent_key: impl Into<String>,
        leaf_key: impl Into<String>,
    ) -> IdentityResult<Self> {
        let codec = Self {
            scope_key: scope_key.into(),
            parent_key: parent_key.into(),
            leaf_key: leaf_key.into(),
            provider: None,
        };
        codec.check_keys()?;
        Ok(codec)
    }

    /// Sets the provider namespace written into encoded identities.
    ///
    /// When set, decoding rejects identities naming a different provider.
    pub fn with_provider(mut self, namespace: impl Into<String>) -> IdentityResult<Self> {
        let namespace = namespace.into();
        if namespace.is_empty() {
            return Err(IdentityError::InvalidKey {
                key: PROVIDERS_KEY.to_string(),
                reason: "provider namespace is empty",
            });
        }
        self.provider = Some(namespace);
        Ok(self)
    }

    /// Returns the configured provider namespace.
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    fn check_keys(&self) -> IdentityResult<()> {
        let keys = [&self.scope_key, &self.parent_key, &self.leaf_key];
        for (i, key) in keys.iter().enumerate() {
            let reason = if key.is_empty() {
                "key is empty"
            } else if key.contains('/') {
                "key contains `/`"
            } else if key.as_str() == PROVIDERS_KEY {
                "key is reserved for the provider namespace"
            } else if keys[..i].contains(key) {
                "key is used more than once"
            } else {
                continue;
            };
            return Err(IdentityError::InvalidKey {
                key: key.to_string(),
                reason,
            });
        }
        Ok(())
    }

    fn take_required(
        &self,
        id: &str,
        pairs: &mut BTreeMap<String, String>,
        key: &str,
    ) -> IdentityResult<String> {
        pairs.remove(key).ok_or_else(|| IdentityError::MissingKey {
            id: id.to_string(),
            key: key.to_string(),
        })
    }
}

impl Default for ResourcePathCodec {
    fn default() -> Self {
        Self {
            scope_key: "resourceGroups".to_string(),
            parent_key: "servers".to_string(),
            leaf_key: "configurations".to_string(),
            provider: Some("Microsoft.DBforPostgreSQL".to_string()),
        }
    }
}

impl IdentityCodec for ResourcePathCodec {
    fn encode(&self, setting: &SettingRef) -> IdentityResult<TrackedId> {
        setting.validate()?;

        let mut path = format!(
            "/{}/{}",
            self.scope_key,
            urlencoding::encode(&setting.scope_id)
        );
        if let Some(provider) = &self.provider {
            path.push_str(&format!(
                "/{PROVIDERS_KEY}/{}",
                urlencoding::encode(provider)
            ));
        }
        path.push_str(&format!(
            "/{}/{}/{}/{}",
            self.parent_key,
            urlencoding::encode(&setting.parent_name),
            self.leaf_key,
            urlencoding::encode(&setting.name)
        ));

        Ok(TrackedId::new(path))
    }

    fn decode(&self, id: &str) -> IdentityResult<SettingRef> {
        let path = id.strip_prefix('/').unwrap_or(id);
        let segments: Vec<&str> = if path.is_empty() {
            Vec::new()
        } else {
            path.split('/').collect()
        };

        if segments.len() % 2 != 0 {
            return Err(IdentityError::OddSegmentCount { id: id.to_string() });
        }

        let mut pairs = BTreeMap::new();
        for pair in segments.chunks(2) {
            let (key, raw_value) = (pair[0], pair[1]);
            if key.is_empty() || raw_value.is_empty() {
                return Err(IdentityError::EmptySegment { id: id.to_string() });
            }
            let value = urlencoding::decode(raw_value)
                .map_err(|_| IdentityError::InvalidEscape {
                    segment: raw_value.to_string(),
                })?
                .into_owned();
            if pairs.insert(key.to_string(), value).is_some() {
                return Err(IdentityError::DuplicateKey {
                    id: id.to_string(),
                    key: key.to_string(),
                });
            }
        }

        if let (Some(expected), Some(found)) = (&self.provider, pairs.get(PROVIDERS_KEY)) {
            if expected != found {
                return Err(IdentityError::ProviderMismatch {
                    expected: expected.clone(),
                    found: found.clone(),
                });
            }
        }

        let scope_id = self.take_required(id, &mut pairs, &self.scope_key)?;
        let parent_name = self.take_required(id, &mut pairs, &self.parent_key)?;
        let name = self.take_required(id, &mut pairs, &self.leaf_key)?;

        Ok(SettingRef {
            scope_id,
            parent_name,
            name,
        })
    }
}
