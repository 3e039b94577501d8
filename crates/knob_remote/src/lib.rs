//! # knob remote
//!
//! The boundary between the reconciler and the remote configuration
//! service.
//!
//! This crate provides:
//! - [`RemoteClient`]: create-or-update and get calls against a setting
//! - [`OperationHandle`]: an in-flight remote mutation that must be waited on
//! - [`RemoteError`]: a closed error taxonomy that classifies absence
//!   separately from transport failures
//! - [`MemoryRemote`]: an in-memory service with delayed operations and
//!   failure injection, for tests and local use
//!
//! ## Key Invariants
//!
//! - A mutation is visible only once its operation reaches a terminal state
//! - Absence is always reported as [`RemoteError::NotFound`], never as a
//!   transport error

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod error;
mod memory;
mod object;

pub use client::{OperationHandle, OperationStatus, RemoteClient};
pub use error::{RemoteError, RemoteResult};
pub use memory::{Catalog, MemoryRemote, MemoryRemoteConfig, ServerEntry, SettingEntry};
pub use object::RemoteObject;
