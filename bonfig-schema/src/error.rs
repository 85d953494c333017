//! Error types for schema declaration and value conversion.

use bonfig_primitives::{FieldPath, Key};
use thiserror::Error;

/// Result alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors produced while converting between typed values and stored values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A stored string could not be parsed into the field's type.
    #[error("cannot parse `{raw}` as {expected}: {reason}")]
    Parse {
        /// Type the codec produces.
        expected: String,
        /// Raw stored text.
        raw: String,
        /// Parser message.
        reason: String,
    },

    /// The stored value has a JSON type the codec does not understand.
    #[error("expected {expected}, found {found}")]
    UnexpectedValue {
        /// Type the codec produces.
        expected: String,
        /// JSON type name of the rejected value.
        found: &'static str,
    },

    /// A date-time format string is not usable.
    #[error("invalid date-time format `{format}`")]
    InvalidFormat {
        /// The offending format string.
        format: String,
    },
}

impl CodecError {
    /// Creates a parse error.
    #[must_use]
    pub fn parse(expected: impl Into<String>, raw: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            expected: expected.into(),
            raw: raw.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an unexpected-value error for `found`.
    #[must_use]
    pub fn unexpected(expected: impl Into<String>, found: &serde_json::Value) -> Self {
        Self::UnexpectedValue {
            expected: expected.into(),
            found: bonfig_store::value_kind(found),
        }
    }
}

/// Errors produced while declaring a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A key or path segment failed validation.
    #[error(transparent)]
    InvalidKey(#[from] bonfig_primitives::Error),

    /// A field refers to a store the schema never declared.
    #[error("schema `{schema}` has no store named `{store}`")]
    UnknownStore {
        /// Name of the schema being built.
        schema: String,
        /// Store that was referenced.
        store: Key,
    },

    /// Two fields were declared at the same path of the same store.
    #[error("field `{path}` is declared twice in store `{store}`")]
    DuplicateField {
        /// Store holding both declarations.
        store: Key,
        /// Conflicting path.
        path: FieldPath,
    },

    /// One field's path is a prefix of another's, so one would overwrite the
    /// other's section.
    #[error("field `{new}` conflicts with field `{existing}` in store `{store}`")]
    PathConflict {
        /// Store holding both declarations.
        store: Key,
        /// Previously declared path.
        existing: FieldPath,
        /// Path being declared.
        new: FieldPath,
    },

    /// A field default could not be encoded by its codec.
    #[error("default for `{path}` is invalid: {source}")]
    InvalidDefault {
        /// Field path.
        path: FieldPath,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// A codec could not be constructed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A field kind name collided with an existing registration.
    #[error("field kind `{name}` is already registered")]
    DuplicateKind {
        /// Name of the offending kind.
        name: String,
    },

    /// Requested field kind does not exist.
    #[error("field kind `{name}` is not registered")]
    UnknownKind {
        /// Name of the missing kind.
        name: String,
    },
}
