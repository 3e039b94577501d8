//! Read command implementation.

use super::Engine;
use knob_engine::{CancellationToken, DesiredState};
use knob_identity::TrackedId;
use serde::Serialize;
use tracing::info;

/// Result of a read.
#[derive(Debug, Serialize)]
pub struct ReadReport {
    /// Identity that was read.
    pub id: TrackedId,
    /// Whether the setting still exists.
    pub exists: bool,
    /// Current state, if it exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<DesiredState>,
}

/// Runs the read command.
pub async fn run(
    engine: &Engine,
    id: &TrackedId,
    cancel: &CancellationToken,
) -> Result<ReadReport, Box<dyn std::error::Error>> {
    let state = engine.read(id, cancel).await?;
    if state.is_none() {
        info!("{} no longer exists; stop tracking it", id);
    }

    Ok(ReadReport {
        id: id.clone(),
        exists: state.is_some(),
        state,
    })
}
