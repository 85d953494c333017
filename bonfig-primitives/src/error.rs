//! Shared error definitions for bonfig primitives.

use thiserror::Error;

/// Result alias used throughout the primitives crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing keys and paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A key segment failed validation.
    #[error("invalid key `{key}`: {reason}")]
    InvalidKey {
        /// The offending key string.
        key: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A path could not be built from the supplied segments.
    #[error("invalid path: {reason}")]
    InvalidPath {
        /// Human-readable reason for rejection.
        reason: String,
    },
}
