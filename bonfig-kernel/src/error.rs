//! Error types for configuration instances.

use bonfig_primitives::{FieldPath, Key};
use bonfig_schema::CodecError;
use bonfig_store::StoreError;
use thiserror::Error;

use crate::lifecycle::LifecycleError;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while loading or accessing a configuration instance.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing is stored at the field's path and no default was configured.
    #[error("no value at `{path}` in store `{store}`")]
    KeyNotFound {
        /// Store that was searched.
        store: Key,
        /// Path that was walked.
        path: FieldPath,
    },

    /// A write was attempted while the instance is locked.
    #[error("config `{schema}` is locked; cannot modify `{target}`")]
    Immutable {
        /// Schema of the locked instance.
        schema: String,
        /// Field path or store the write was aimed at.
        target: String,
    },

    /// Load logic returned without filling a declared store.
    #[error("load logic for config `{schema}` did not provide store `{store}`")]
    MissingStore {
        /// Schema being constructed.
        schema: String,
        /// Store left empty.
        store: Key,
    },

    /// A store name was used that the schema never declared.
    #[error("config `{schema}` declares no store named `{store}`")]
    UnknownStore {
        /// Schema of the instance.
        schema: String,
        /// Name that was used.
        store: String,
    },

    /// A field handle does not belong to this instance's schema.
    #[error("config `{schema}` declares no field `{path}` in store `{store}`")]
    UnknownField {
        /// Schema of the instance.
        schema: String,
        /// Store named by the handle.
        store: Key,
        /// Path named by the handle.
        path: FieldPath,
    },

    /// User load logic failed.
    #[error("failed to load config `{schema}`")]
    Load {
        /// Schema being constructed.
        schema: String,
        /// Error returned by the loader.
        #[source]
        source: anyhow::Error,
    },

    /// The backing store rejected a lookup or assignment.
    #[error("store `{store}` failed")]
    Store {
        /// Store that failed.
        store: Key,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// A stored value could not be converted.
    #[error("cannot convert value at `{path}`")]
    Codec {
        /// Field path being converted.
        path: FieldPath,
        /// Underlying codec error.
        #[source]
        source: CodecError,
    },

    /// A lock or unlock was requested from a state that does not allow it.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}
