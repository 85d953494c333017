//! Error types for the store subsystem.

use bonfig_primitives::FieldPath;
use thiserror::Error;

/// Errors emitted by store implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A path segment resolved to a scalar where a nested container was needed.
    #[error("`{at}` is not a container while resolving `{path}`")]
    NotAContainer {
        /// Full path being resolved.
        path: FieldPath,
        /// Key at which the walk hit a non-container value.
        at: String,
    },
    /// The store cannot address paths of this shape.
    #[error("{kind} store cannot address `{path}`: {reason}")]
    UnsupportedPath {
        /// Store kind reporting the error.
        kind: &'static str,
        /// Offending path.
        path: FieldPath,
        /// Human-readable reason.
        reason: &'static str,
    },
    /// The store cannot hold the supplied value.
    #[error("{kind} store cannot hold a {found} value at `{path}`; only strings are supported")]
    UnsupportedValue {
        /// Store kind reporting the error.
        kind: &'static str,
        /// Path the value was destined for.
        path: FieldPath,
        /// JSON type name of the rejected value.
        found: &'static str,
    },
    /// A store was constructed from a document whose root is not an object.
    #[error("store root must be an object, found {found}")]
    InvalidRoot {
        /// JSON type name of the rejected root.
        found: &'static str,
    },
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Returns the JSON type name of `value`, used in error messages.
#[must_use]
pub fn value_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
