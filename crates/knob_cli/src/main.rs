//! knob CLI
//!
//! Command-line driver for the reconciliation engine. Settings live in a
//! JSON catalog that stands in for the remote service; mutating commands
//! write the catalog back when they finish.
//!
//! # Commands
//!
//! - `apply` - Plan and reconcile a setting toward a value
//! - `plan` - Show what `apply` would do
//! - `read` - Refresh a tracked setting
//! - `reset` - Reset a tracked setting to its default
//! - `import` - Adopt an existing setting by identity

mod catalog;
mod commands;

use clap::{Args, Parser, Subcommand};
use knob_engine::{CancellationToken, Reconciler, ReconcilerConfig};
use knob_remote::{MemoryRemote, MemoryRemoteConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Reconcile remote configuration settings.
#[derive(Parser)]
#[command(name = "knob")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JSON settings catalog
    #[arg(global = true, short, long, default_value = "catalog.json")]
    catalog: PathBuf,

    /// Delay between polls of in-flight operations, in milliseconds
    #[arg(global = true, long, default_value = "100")]
    poll_interval_ms: u64,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Desired state given on the command line.
#[derive(Args)]
struct DesiredArgs {
    /// Container scope (resource group)
    #[arg(long)]
    scope: String,

    /// Parent resource (server)
    #[arg(long)]
    parent: String,

    /// Setting name
    #[arg(long)]
    name: String,

    /// Desired value
    #[arg(long)]
    value: String,

    /// Identity currently tracked for this setting, if any
    #[arg(long)]
    tracked: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan and reconcile a setting toward a value
    Apply(DesiredArgs),

    /// Show what apply would do
    Plan(DesiredArgs),

    /// Refresh a tracked setting
    Read {
        /// Tracked identity
        id: String,
    },

    /// Reset a tracked setting to its default
    Reset {
        /// Tracked identity
        id: String,
    },

    /// Adopt an existing setting by identity
    Import {
        /// Identity issued by the service
        id: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("knob CLI v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let catalog = catalog::load(&cli.catalog)?;
    let remote = MemoryRemote::from_catalog(MemoryRemoteConfig::new(), catalog);
    let config =
        ReconcilerConfig::new().with_poll_interval(Duration::from_millis(cli.poll_interval_ms));
    let reconciler = Reconciler::new(remote.clone(), config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    execute(cli.command, &cli.catalog, &remote, &reconciler, &cancel).await
}

/// Runs `command` and writes the catalog back after apply and reset.
async fn execute(
    command: Commands,
    catalog_path: &Path,
    remote: &MemoryRemote,
    reconciler: &commands::Engine,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    // A failed apply or reset may still have changed the catalog.
    let mutating = matches!(command, Commands::Apply(_) | Commands::Reset { .. });
    let result = run(command, reconciler, cancel).await;

    if mutating {
        catalog::save(catalog_path, &remote.snapshot())?;
        info!("Wrote catalog {:?}", catalog_path);
    }

    result
}

async fn run(
    command: Commands,
    reconciler: &commands::Engine,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Apply(args) => {
            let report =
                commands::apply::run(reconciler, &args.desired(), args.tracked(), cancel).await?;
            commands::print_json(&report)?;
        }
        Commands::Plan(args) => {
            let report = commands::plan::run(reconciler, &args.desired(), args.tracked())?;
            commands::print_json(&report)?;
        }
        Commands::Read { id } => {
            let report = commands::read::run(reconciler, &id.into(), cancel).await?;
            commands::print_json(&report)?;
        }
        Commands::Reset { id } => {
            commands::reset::run(reconciler, &id.into(), cancel).await?;
        }
        Commands::Import { id } => {
            let report = commands::import::run(reconciler, &id, cancel).await?;
            commands::print_json(&report)?;
        }
        Commands::Version => {}
    }
    Ok(())
}

impl DesiredArgs {
    fn desired(&self) -> knob_engine::DesiredState {
        knob_engine::DesiredState {
            name: self.name.clone(),
            scope_id: self.scope.clone(),
            parent_name: self.parent.clone(),
            value: self.value.clone(),
        }
    }

    fn tracked(&self) -> Option<knob_identity::TrackedId> {
        self.tracked.clone().map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::engine;

    fn desired_args(value: &str) -> DesiredArgs {
        DesiredArgs {
            scope: "rg1".into(),
            parent: "server1".into(),
            name: "shared_buffers".into(),
            value: value.into(),
            tracked: None,
        }
    }

    #[tokio::test]
    async fn failed_apply_still_writes_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let (remote, engine) = engine();
        remote.vanish_during_next_operation();

        let result = execute(
            Commands::Apply(desired_args("512MB")),
            &path,
            &remote,
            &engine,
            &CancellationToken::new(),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(catalog::load(&path).unwrap().setting_count(), 0);
    }

    #[tokio::test]
    async fn apply_writes_catalog_and_plan_does_not() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let (remote, engine) = engine();
        let cancel = CancellationToken::new();

        execute(Commands::Plan(desired_args("512MB")), &path, &remote, &engine, &cancel)
            .await
            .unwrap();
        assert!(!path.exists());

        execute(Commands::Apply(desired_args("512MB")), &path, &remote, &engine, &cancel)
            .await
            .unwrap();
        let saved = catalog::load(&path).unwrap();
        let setting = knob_identity::SettingRef::new("rg1", "server1", "shared_buffers");
        assert_eq!(saved.setting(&setting).unwrap().value, "512MB");
    }
}
