//! Core shared types for declarative configuration schemas.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod key;
mod path;

/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Validated segment of a field path.
pub use key::Key;
/// Ordered key sequence locating a value inside a store.
pub use path::FieldPath;
