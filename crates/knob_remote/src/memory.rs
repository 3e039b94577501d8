//! In-memory remote configuration service.
//!
//! Models a service where settings belong to servers inside scopes, every
//! setting has a system default, and mutations complete asynchronously.
//! Settings cannot be created by clients; writing to an unknown server or
//! setting reports not-found, like a managed database service would.

use crate::client::{OperationHandle, OperationStatus, RemoteClient};
use crate::error::{RemoteError, RemoteResult};
use crate::object::RemoteObject;
use async_trait::async_trait;
use knob_identity::{IdentityCodec, ResourcePathCodec, SettingRef};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// A single setting held by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingEntry {
    /// Value currently in effect.
    pub value: String,
    /// System default.
    pub default_value: String,
}

/// A server and its settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    /// Settings by name.
    #[serde(default)]
    pub settings: BTreeMap<String, SettingEntry>,
}

/// The full contents of an in-memory service: scope → server → settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Servers by scope, then by name.
    #[serde(default)]
    pub scopes: BTreeMap<String, BTreeMap<String, ServerEntry>>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a server, if it exists.
    pub fn server(&self, scope_id: &str, parent_name: &str) -> Option<&ServerEntry> {
        self.scopes.get(scope_id)?.get(parent_name)
    }

    /// Returns a setting, if it and its server exist.
    pub fn setting(&self, setting: &SettingRef) -> Option<&SettingEntry> {
        self.server(&setting.scope_id, &setting.parent_name)?
            .settings
            .get(&setting.name)
    }

    fn setting_mut(&mut self, setting: &SettingRef) -> Option<&mut SettingEntry> {
        self.scopes
            .get_mut(&setting.scope_id)?
            .get_mut(&setting.parent_name)?
            .settings
            .get_mut(&setting.name)
    }

    /// Adds a server with no settings. Existing servers are kept.
    pub fn insert_server(&mut self, scope_id: &str, parent_name: &str) {
        self.scopes
            .entry(scope_id.to_string())
            .or_default()
            .entry(parent_name.to_string())
            .or_default();
    }

    /// Adds a setting at its default value, creating the server if needed.
    pub fn insert_setting(&mut self, setting: &SettingRef, default_value: &str) {
        self.scopes
            .entry(setting.scope_id.clone())
            .or_default()
            .entry(setting.parent_name.clone())
            .or_default()
            .settings
            .insert(
                setting.name.clone(),
                SettingEntry {
                    value: default_value.to_string(),
                    default_value: default_value.to_string(),
                },
            );
    }

    /// Removes a setting. Returns the removed entry.
    pub fn remove_setting(&mut self, setting: &SettingRef) -> Option<SettingEntry> {
        self.scopes
            .get_mut(&setting.scope_id)?
            .get_mut(&setting.parent_name)?
            .settings
            .remove(&setting.name)
    }

    /// Removes a server and all of its settings.
    pub fn remove_server(&mut self, scope_id: &str, parent_name: &str) -> bool {
        self.scopes
            .get_mut(scope_id)
            .and_then(|servers| servers.remove(parent_name))
            .is_some()
    }

    /// Total number of settings across all servers.
    pub fn setting_count(&self) -> usize {
        self.scopes
            .values()
            .flat_map(|servers| servers.values())
            .map(|server| server.settings.len())
            .sum()
    }
}

/// Configuration for a [`MemoryRemote`].
#[derive(Debug, Clone)]
pub struct MemoryRemoteConfig {
    /// Number of polls that report in-progress before an operation
    /// completes.
    pub polls_to_complete: u32,
    /// Leave `id` unset in read responses.
    pub omit_ids: bool,
}

impl MemoryRemoteConfig {
    /// Creates a configuration where operations complete on the second poll.
    pub fn new() -> Self {
        Self {
            polls_to_complete: 1,
            omit_ids: false,
        }
    }

    /// Sets how many polls report in-progress.
    pub fn with_polls_to_complete(mut self, polls: u32) -> Self {
        self.polls_to_complete = polls;
        self
    }

    /// Sets whether read responses omit the canonical id.
    pub fn with_omit_ids(mut self, omit: bool) -> Self {
        self.omit_ids = omit;
        self
    }
}

impl Default for MemoryRemoteConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct Faults {
    submit: Option<RemoteError>,
    get: Option<RemoteError>,
    operation: Option<String>,
    vanish: bool,
}

struct Shared {
    config: MemoryRemoteConfig,
    codec: ResourcePathCodec,
    catalog: RwLock<Catalog>,
    faults: Mutex<Faults>,
    submits: AtomicU64,
    gets: AtomicU64,
    completed: AtomicU64,
}

/// An in-memory [`RemoteClient`].
///
/// Cloning yields another client for the same service.
#[derive(Clone)]
pub struct MemoryRemote {
    shared: Arc<Shared>,
}

impl MemoryRemote {
    /// Creates an empty service.
    pub fn new(config: MemoryRemoteConfig) -> Self {
        Self::from_catalog(config, Catalog::new())
    }

    /// Creates a service holding `catalog`.
    pub fn from_catalog(config: MemoryRemoteConfig, catalog: Catalog) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                codec: ResourcePathCodec::default(),
                catalog: RwLock::new(catalog),
                faults: Mutex::new(Faults::default()),
                submits: AtomicU64::new(0),
                gets: AtomicU64::new(0),
                completed: AtomicU64::new(0),
            }),
        }
    }

    /// Adds a setting at its default value.
    pub fn seed_setting(&self, setting: &SettingRef, default_value: &str) {
        self.shared
            .catalog
            .write()
            .insert_setting(setting, default_value);
    }

    /// Changes a setting's value out of band. Returns false if it does not
    /// exist.
    pub fn set_value(&self, setting: &SettingRef, value: &str) -> bool {
        match self.shared.catalog.write().setting_mut(setting) {
            Some(entry) => {
                entry.value = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Removes a setting out of band.
    pub fn remove_setting(&self, setting: &SettingRef) -> bool {
        self.shared
            .catalog
            .write()
            .remove_setting(setting)
            .is_some()
    }

    /// Removes a server out of band.
    pub fn remove_server(&self, scope_id: &str, parent_name: &str) -> bool {
        self.shared
            .catalog
            .write()
            .remove_server(scope_id, parent_name)
    }

    /// Returns a setting's current value.
    pub fn value(&self, setting: &SettingRef) -> Option<String> {
        self.shared
            .catalog
            .read()
            .setting(setting)
            .map(|entry| entry.value.clone())
    }

    /// Returns a copy of the whole catalog.
    pub fn snapshot(&self) -> Catalog {
        self.shared.catalog.read().clone()
    }

    /// Makes the next `create_or_update` fail with `error`.
    pub fn fail_next_submit(&self, error: RemoteError) {
        self.shared.faults.lock().submit = Some(error);
    }

    /// Makes the next `get` fail with `error`.
    pub fn fail_next_get(&self, error: RemoteError) {
        self.shared.faults.lock().get = Some(error);
    }

    /// Makes the next submitted operation fail when it completes. The
    /// setting keeps its previous value.
    pub fn fail_next_operation(&self, message: impl Into<String>) {
        self.shared.faults.lock().operation = Some(message.into());
    }

    /// Removes the target setting while the next operation is in flight.
    pub fn vanish_during_next_operation(&self) {
        self.shared.faults.lock().vanish = true;
    }

    /// Number of `create_or_update` calls received.
    pub fn submit_count(&self) -> u64 {
        self.shared.submits.load(Ordering::SeqCst)
    }

    /// Number of `get` calls received.
    pub fn get_count(&self) -> u64 {
        self.shared.gets.load(Ordering::SeqCst)
    }

    /// Number of operations that completed successfully.
    pub fn completed_count(&self) -> u64 {
        self.shared.completed.load(Ordering::SeqCst)
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new(MemoryRemoteConfig::default())
    }
}

#[async_trait]
impl RemoteClient for MemoryRemote {
    async fn create_or_update(
        &self,
        setting: &SettingRef,
        value: &str,
    ) -> RemoteResult<Box<dyn OperationHandle>> {
        self.shared.submits.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.shared.faults.lock().submit.take() {
            return Err(err);
        }

        {
            let catalog = self.shared.catalog.read();
            if catalog
                .server(&setting.scope_id, &setting.parent_name)
                .is_none()
            {
                return Err(RemoteError::not_found(format!(
                    "server {}/{}",
                    setting.scope_id, setting.parent_name
                )));
            }
            if catalog.setting(setting).is_none() {
                return Err(RemoteError::not_found(format!("configuration {setting}")));
            }
        }

        // Operation faults arm only operations that were actually accepted.
        let (failure, vanish) = {
            let mut faults = self.shared.faults.lock();
            (faults.operation.take(), std::mem::take(&mut faults.vanish))
        };

        let id = Uuid::new_v4().to_string();
        info!(operation = %id, %setting, "accepted configuration update");

        Ok(Box::new(MemoryOperation {
            id,
            shared: Arc::clone(&self.shared),
            setting: setting.clone(),
            value: value.to_string(),
            polls_remaining: self.shared.config.polls_to_complete,
            failure,
            vanish,
            outcome: None,
        }))
    }

    async fn get(&self, setting: &SettingRef) -> RemoteResult<RemoteObject> {
        self.shared.gets.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.shared.faults.lock().get.take() {
            return Err(err);
        }

        let entry = self
            .shared
            .catalog
            .read()
            .setting(setting)
            .cloned()
            .ok_or_else(|| RemoteError::not_found(format!("configuration {setting}")))?;

        let id = if self.shared.config.omit_ids {
            None
        } else {
            let id = self
                .shared
                .codec
                .encode(setting)
                .map_err(|e| RemoteError::Malformed(e.to_string()))?;
            Some(id.into_string())
        };

        Ok(RemoteObject {
            id,
            name: setting.name.clone(),
            value: entry.value,
            default_value: entry.default_value,
        })
    }
}

struct MemoryOperation {
    id: String,
    shared: Arc<Shared>,
    setting: SettingRef,
    value: String,
    polls_remaining: u32,
    failure: Option<String>,
    vanish: bool,
    outcome: Option<RemoteResult<OperationStatus>>,
}

impl MemoryOperation {
    fn complete(&mut self) -> RemoteResult<OperationStatus> {
        let mut catalog = self.shared.catalog.write();

        if self.vanish {
            catalog.remove_setting(&self.setting);
        }

        if let Some(message) = self.failure.take() {
            return Err(RemoteError::OperationFailed {
                operation_id: self.id.clone(),
                message,
            });
        }

        let entry = catalog
            .setting_mut(&self.setting)
            .ok_or_else(|| RemoteError::not_found(format!("configuration {}", self.setting)))?;
        entry.value = self.value.clone();
        self.shared.completed.fetch_add(1, Ordering::SeqCst);

        Ok(OperationStatus::Succeeded)
    }
}

#[async_trait]
impl OperationHandle for MemoryOperation {
    fn id(&self) -> &str {
        &self.id
    }

    async fn poll(&mut self) -> RemoteResult<OperationStatus> {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        if self.polls_remaining > 0 {
            self.polls_remaining -= 1;
            return Ok(OperationStatus::InProgress);
        }

        let outcome = self.complete();
        debug!(operation = %self.id, ?outcome, "operation finished");
        self.outcome = Some(outcome.clone());
        outcome
    }
}
