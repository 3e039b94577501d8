//! # knob engine
//!
//! Reconciliation engine for a single remote configuration setting.
//!
//! This crate provides:
//! - [`Reconciler`]: apply, read, reset-to-default and import lifecycle
//! - [`Plan`]: mapping of desired state and tracked identity onto an action
//! - Normalization of remote absence into idempotent outcomes
//!
//! ## Lifecycle
//!
//! ```text
//! Absent     --apply-->  Present(v)
//! Present(a) --apply-->  Present(b)
//! Present(v) --reset-->  Present(default)
//! Absent     --reset-->  Absent          (no-op, not an error)
//! Absent     --read--->  None
//! ```
//!
//! ## Key Invariants
//!
//! - Apply always waits for the remote operation, then confirms by reading
//! - Delete is modelled as a reset to the default read from the service;
//!   the engine never invents a default
//! - Not-found on read is a normal outcome, never an error
//! - Malformed tracked identities are always surfaced
//! - No internal retries; every await honours the caller's cancellation

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod desired;
mod error;
mod plan;
mod reconciler;

pub use config::ReconcilerConfig;
pub use desired::DesiredState;
pub use error::{Operation, ReconcileError, ReconcileResult};
pub use plan::{Outcome, Plan};
pub use reconciler::{Imported, Reconciler};

pub use tokio_util::sync::CancellationToken;
