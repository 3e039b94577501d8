//! Import command implementation.

use super::Engine;
use knob_engine::{CancellationToken, DesiredState};
use knob_identity::TrackedId;
use serde::Serialize;

/// Result of an import.
#[derive(Debug, Serialize)]
pub struct ImportReport {
    /// Canonical identity to track.
    pub id: TrackedId,
    /// State the service currently holds.
    pub state: DesiredState,
}

/// Runs the import command.
pub async fn run(
    engine: &Engine,
    raw_id: &str,
    cancel: &CancellationToken,
) -> Result<ImportReport, Box<dyn std::error::Error>> {
    let imported = engine
        .import(raw_id, cancel)
        .await?
        .ok_or_else(|| format!("Cannot import {}: setting does not exist", raw_id))?;

    Ok(ImportReport {
        id: imported.tracked,
        state: imported.state,
    })
}
