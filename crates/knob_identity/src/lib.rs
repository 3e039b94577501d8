//! # knob identity
//!
//! Addressing for remote configuration settings.
//!
//! A setting is addressed by a triple of container scope, parent resource
//! and leaf name ([`SettingRef`]). Callers persist a single opaque string
//! ([`TrackedId`]) instead of the triple; an [`IdentityCodec`] converts
//! between the two.
//!
//! ## Key Invariants
//!
//! - `decode(encode(t)) == t` for every triple with non-empty components
//! - Decoding is total: a malformed identity yields an [`IdentityError`],
//!   never a partially filled triple

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod error;
mod setting;

pub use codec::{IdentityCodec, ResourcePathCodec};
pub use error::{IdentityError, IdentityResult};
pub use setting::{SettingRef, TrackedId};
