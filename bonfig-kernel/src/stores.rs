//! Store slots filled by load logic.

use std::collections::BTreeMap;
use std::fmt;

use bonfig_primitives::Key;
use bonfig_store::Store;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Per-instance store slots, restricted to the names a schema declares.
///
/// Load logic receives a `&mut Stores` and installs one container per
/// declared store name.
pub struct Stores {
    schema: String,
    declared: Vec<Key>,
    slots: BTreeMap<Key, Box<dyn Store>>,
}

impl fmt::Debug for Stores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filled: Vec<(&str, &'static str)> = self
            .slots
            .iter()
            .map(|(name, store)| (name.as_str(), store.kind()))
            .collect();
        f.debug_struct("Stores")
            .field("schema", &self.schema)
            .field("declared", &self.declared)
            .field("filled", &filled)
            .finish()
    }
}

impl Stores {
    pub(crate) fn new(schema: &str, declared: &[Key]) -> Self {
        Self {
            schema: schema.to_owned(),
            declared: declared.to_vec(),
            slots: BTreeMap::new(),
        }
    }

    /// Store names declared by the schema.
    #[must_use]
    pub fn declared(&self) -> &[Key] {
        &self.declared
    }

    /// Installs `store` under `name`, replacing any earlier store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownStore`] if `name` was not declared.
    pub fn insert<S>(&mut self, name: &str, store: S) -> ConfigResult<()>
    where
        S: Store + 'static,
    {
        self.insert_boxed(name, Box::new(store))
    }

    /// Installs an already boxed store under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownStore`] if `name` was not declared.
    pub fn insert_boxed(&mut self, name: &str, store: Box<dyn Store>) -> ConfigResult<()> {
        let Some(key) = self.declared.iter().find(|key| key.as_str() == name) else {
            return Err(ConfigError::UnknownStore {
                schema: self.schema.clone(),
                store: name.to_owned(),
            });
        };
        debug!(schema = %self.schema, store = %key, kind = store.kind(), "installed store");
        self.slots.insert(key.clone(), store);
        Ok(())
    }

    /// Returns the store installed under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Store> {
        self.slots.get(name).map(|store| &**store)
    }

    /// Returns `true` once a store is installed under `name`.
    #[must_use]
    pub fn is_filled(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Store + 'static)> {
        self.slots.get_mut(name).map(|store| &mut **store)
    }

    pub(crate) fn first_missing(&self) -> Option<&Key> {
        self.declared
            .iter()
            .find(|key| !self.slots.contains_key(*key))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &(dyn Store + 'static))> {
        self.slots.iter().map(|(key, store)| (key, &**store))
    }
}

/// User-supplied load logic, invoked once while an instance is constructed.
///
/// Implemented for any `FnOnce(&mut Stores) -> anyhow::Result<()>`, so I/O and
/// parsing errors can be propagated with `?`.
pub trait Loader {
    /// Fills every declared store.
    ///
    /// # Errors
    ///
    /// Any error aborts construction and is reported as
    /// [`ConfigError::Load`].
    fn load(self, stores: &mut Stores) -> anyhow::Result<()>;
}

impl<F> Loader for F
where
    F: FnOnce(&mut Stores) -> anyhow::Result<()>,
{
    fn load(self, stores: &mut Stores) -> anyhow::Result<()> {
        self(stores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bonfig_store::MemoryStore;

    fn stores() -> Stores {
        Stores::new("Basic", &[Key::new("d").unwrap(), Key::new("ini").unwrap()])
    }

    #[test]
    fn only_declared_names_are_accepted() {
        let mut stores = stores();
        stores.insert("d", MemoryStore::new()).unwrap();
        let err = stores
            .insert("elsewhere", MemoryStore::new())
            .expect_err("undeclared");
        assert!(matches!(err, ConfigError::UnknownStore { store, .. } if store == "elsewhere"));
        assert!(stores.is_filled("d"));
        assert_eq!(stores.get("d").map(|store| store.kind()), Some("memory"));
    }

    #[test]
    fn reports_first_missing_store() {
        let mut stores = stores();
        assert_eq!(stores.first_missing().map(Key::as_str), Some("d"));
        stores.insert("d", MemoryStore::new()).unwrap();
        assert_eq!(stores.first_missing().map(Key::as_str), Some("ini"));
        stores.insert("ini", MemoryStore::new()).unwrap();
        assert!(stores.first_missing().is_none());
    }
}
