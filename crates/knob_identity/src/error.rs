//! Error types for identity handling.

use thiserror::Error;

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Errors that can occur while encoding or decoding a setting identity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// A component of the triple is empty.
    #[error("identity component `{component}` must not be empty")]
    EmptyComponent {
        /// Name of the empty component.
        component: &'static str,
    },

    /// The path does not split into key/value pairs.
    #[error("identity `{id}` has an odd number of path segments")]
    OddSegmentCount {
        /// The identity being decoded.
        id: String,
    },

    /// A key or value segment is empty.
    #[error("identity `{id}` contains an empty path segment")]
    EmptySegment {
        /// The identity being decoded.
        id: String,
    },

    /// The same key occurs twice.
    #[error("identity `{id}` repeats key `{key}`")]
    DuplicateKey {
        /// The identity being decoded.
        id: String,
        /// The repeated key.
        key: String,
    },

    /// A required key is absent.
    #[error("identity `{id}` is missing key `{key}`")]
    MissingKey {
        /// The identity being decoded.
        id: String,
        /// The missing key.
        key: String,
    },

    /// The provider namespace does not match the codec's.
    #[error("identity provider `{found}` does not match expected `{expected}`")]
    ProviderMismatch {
        /// Namespace the codec was configured with.
        expected: String,
        /// Namespace found in the identity.
        found: String,
    },

    /// A segment's percent escapes do not decode to valid UTF-8.
    #[error("invalid escape sequence in segment `{segment}`")]
    InvalidEscape {
        /// The offending raw segment.
        segment: String,
    },

    /// A codec was configured with a segment key or provider it cannot decode.
    #[error("invalid codec key `{key}`: {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why the key was rejected.
        reason: &'static str,
    },
}
