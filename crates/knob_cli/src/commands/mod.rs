//! CLI command implementations.

pub mod apply;
pub mod import;
pub mod plan;
pub mod read;
pub mod reset;

use knob_engine::Reconciler;
use knob_remote::MemoryRemote;
use serde::Serialize;

/// The reconciler the CLI drives.
pub type Engine = Reconciler<MemoryRemote>;

/// Prints a report as pretty JSON on stdout.
pub fn print_json<T: Serialize>(report: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
