//! Backing stores for declarative configurations.
//!
//! A store is any keyed container a configuration instance can read fields from
//! and write fields into. Three implementations ship with the crate: a nested
//! JSON tree ([`MemoryStore`]), a two-level parser-style store holding strings
//! ([`SectionedStore`]), and a snapshot of environment variables ([`EnvStore`]).
//! Anything else can participate by implementing [`Store`].

#![warn(missing_docs, clippy::pedantic)]

mod env;
mod error;
mod memory;
mod sectioned;

use std::fmt;

use bonfig_primitives::FieldPath;
use serde_json::Value;

pub use env::EnvStore;
pub use error::{StoreError, StoreResult, value_kind};
pub use memory::MemoryStore;
pub use sectioned::SectionedStore;

/// Keyed container backing one named store of a configuration instance.
pub trait Store: fmt::Debug + Send + Sync {
    /// Short, human-readable name of the implementation.
    fn kind(&self) -> &'static str;

    /// Walks `path` and returns a copy of the value found there.
    ///
    /// Returns `Ok(None)` when any segment is absent. Paths ending on a nested
    /// container return that container as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the path cannot be addressed by this store.
    fn lookup(&self, path: &FieldPath) -> StoreResult<Option<Value>>;

    /// Returns the value of the field at `path`.
    ///
    /// Unlike [`Store::lookup`], this is never a container read. Stores whose
    /// short paths name containers reject such paths here instead of handing
    /// back the container.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the path cannot address a field in this
    /// store.
    fn lookup_field(&self, path: &FieldPath) -> StoreResult<Option<Value>> {
        self.lookup(path)
    }

    /// Walks `path`, creating intermediate containers as needed, and assigns
    /// `value` at the final key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the path cannot be addressed or the value
    /// cannot be held by this store.
    fn assign(&mut self, path: &FieldPath, value: Value) -> StoreResult<()>;

    /// Returns `true` if a field value is present at `path`.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Store::lookup_field`].
    fn contains(&self, path: &FieldPath) -> StoreResult<bool> {
        Ok(self.lookup_field(path)?.is_some())
    }

    /// Renders the whole store as a JSON value.
    fn snapshot(&self) -> Value;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn lookup(&self, path: &FieldPath) -> StoreResult<Option<Value>> {
        (**self).lookup(path)
    }

    fn lookup_field(&self, path: &FieldPath) -> StoreResult<Option<Value>> {
        (**self).lookup_field(path)
    }

    fn assign(&mut self, path: &FieldPath, value: Value) -> StoreResult<()> {
        (**self).assign(path, value)
    }

    fn contains(&self, path: &FieldPath) -> StoreResult<bool> {
        (**self).contains(path)
    }

    fn snapshot(&self) -> Value {
        (**self).snapshot()
    }
}
