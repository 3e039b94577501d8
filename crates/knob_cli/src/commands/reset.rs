//! Reset command implementation.

use super::Engine;
use knob_engine::CancellationToken;
use knob_identity::TrackedId;
use tracing::info;

/// Runs the reset command.
pub async fn run(
    engine: &Engine,
    id: &TrackedId,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Resetting {} to its default", id);
    engine.reset_to_default(id, cancel).await?;
    println!("Reset {}", id);
    Ok(())
}
