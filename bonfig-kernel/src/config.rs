//! Configuration instances: construction, field access, and locking.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use bonfig_primitives::{FieldPath, Key};
use bonfig_schema::{Field, FieldDef, Schema, Section};
use bonfig_store::Store;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::lifecycle::{ConfigState, Lifecycle, LifecycleEvent};
use crate::stores::{Loader, Stores};

/// Builder controlling how a [`Config`] is constructed.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    schema: Arc<Schema>,
    locked: bool,
}

impl ConfigBuilder {
    /// Selects whether the instance is locked once loading finishes.
    /// Defaults to `true`.
    #[must_use]
    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Runs `loader`, applies defaults, and returns the finished instance.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if the loader fails,
    /// [`ConfigError::MissingStore`] if it leaves a declared store empty, and
    /// [`ConfigError::Store`] if a default cannot be written.
    pub fn load<L: Loader>(self, loader: L) -> ConfigResult<Config> {
        let schema = self.schema;
        let mut lifecycle = Lifecycle::new(schema.name());
        let mut stores = Stores::new(schema.name(), schema.stores());

        loader.load(&mut stores).map_err(|source| ConfigError::Load {
            schema: schema.name().to_owned(),
            source,
        })?;

        if let Some(store) = stores.first_missing() {
            return Err(ConfigError::MissingStore {
                schema: schema.name().to_owned(),
                store: store.clone(),
            });
        }

        for def in schema.fields() {
            initialise(&mut stores, def)?;
        }

        lifecycle.transition(LifecycleEvent::Load)?;
        if self.locked {
            lifecycle.transition(LifecycleEvent::Lock)?;
        }

        Ok(Config {
            schema,
            stores,
            lifecycle,
        })
    }
}

/// Writes the default of `def` unless its store already holds a value.
fn initialise(stores: &mut Stores, def: &FieldDef) -> ConfigResult<()> {
    let Some(default) = def.default_raw() else {
        return Ok(());
    };
    let store_error = |source| ConfigError::Store {
        store: def.store().clone(),
        source,
    };
    let Some(store) = stores.get_mut(def.store().as_str()) else {
        return Ok(());
    };
    if store.contains(def.path()).map_err(store_error)? {
        return Ok(());
    }
    debug!(store = %def.store(), field = %def.path(), "materialised default");
    store
        .assign(def.path(), default.clone())
        .map_err(store_error)
}

/// A loaded configuration: one store per declared name plus the shared
/// schema.
///
/// Values are read and written through [`Field`] handles obtained while the
/// schema was built. Instances start out locked unless constructed with
/// [`ConfigBuilder::locked`]`(false)`; while locked, every write fails with
/// [`ConfigError::Immutable`].
#[derive(Debug)]
pub struct Config {
    schema: Arc<Schema>,
    stores: Stores,
    lifecycle: Lifecycle,
}

impl Config {
    /// Starts constructing an instance of `schema`.
    #[must_use]
    pub fn builder(schema: impl Into<Arc<Schema>>) -> ConfigBuilder {
        ConfigBuilder {
            schema: schema.into(),
            locked: true,
        }
    }

    /// Constructs a locked instance of `schema` using `loader`.
    ///
    /// # Errors
    ///
    /// See [`ConfigBuilder::load`].
    pub fn load<L: Loader>(schema: impl Into<Arc<Schema>>, loader: L) -> ConfigResult<Self> {
        Self::builder(schema).load(loader)
    }

    /// Schema this instance was built from.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ConfigState {
        self.lifecycle.state()
    }

    /// Returns `true` while writes are rejected.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.lifecycle.state().is_locked()
    }

    /// Freezes the instance. Locking twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Lifecycle`] if the transition is not allowed.
    pub fn lock(&mut self) -> ConfigResult<ConfigState> {
        Ok(self.lifecycle.transition(LifecycleEvent::Lock)?)
    }

    /// Thaws the instance so writes are accepted again.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Lifecycle`] if the transition is not allowed.
    pub fn unlock(&mut self) -> ConfigResult<ConfigState> {
        Ok(self.lifecycle.transition(LifecycleEvent::Unlock)?)
    }

    /// Unlocks the instance until the returned guard is dropped.
    ///
    /// The guard relocks on drop, including during unwinding.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Lifecycle`] if the instance cannot be unlocked.
    pub fn unlocked(&mut self) -> ConfigResult<UnlockGuard<'_>> {
        self.unlock()?;
        Ok(UnlockGuard { config: self })
    }

    /// Runs `f` with the instance unlocked, relocking afterwards however `f`
    /// exits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Lifecycle`] if the instance cannot be unlocked.
    pub fn with_unlocked<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> ConfigResult<R> {
        let mut guard = self.unlocked()?;
        Ok(f(&mut guard))
    }

    /// Reads `field`, falling back to its default when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KeyNotFound`] when the value is absent and no
    /// default exists, [`ConfigError::UnknownField`] for handles from another
    /// schema, and [`ConfigError::Codec`] when the stored value cannot be
    /// decoded.
    pub fn get<T: 'static>(&self, field: &Field<T>) -> ConfigResult<T> {
        self.try_get(field)?.ok_or_else(|| ConfigError::KeyNotFound {
            store: field.store().clone(),
            path: field.path().clone(),
        })
    }

    /// Reads `field`, returning `None` when neither a value nor a default
    /// exists.
    ///
    /// # Errors
    ///
    /// See [`Config::get`].
    pub fn try_get<T: 'static>(&self, field: &Field<T>) -> ConfigResult<Option<T>> {
        let codec_error = |source| ConfigError::Codec {
            path: field.path().clone(),
            source,
        };
        match self.get_raw(field.def())? {
            Some(raw) => field.decode(raw).map(Some).map_err(codec_error),
            None => field.default_value().map_err(codec_error),
        }
    }

    /// Returns `true` if a value is stored for `field`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownField`] for handles from another schema
    /// and [`ConfigError::Store`] when the store cannot address the path.
    pub fn contains<T: 'static>(&self, field: &Field<T>) -> ConfigResult<bool> {
        Ok(self.get_raw(field.def())?.is_some())
    }

    /// Returns the stored value of `def` before decoding, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownField`] for definitions from another
    /// schema and [`ConfigError::Store`] when the store cannot address the
    /// path.
    pub fn get_raw(&self, def: &FieldDef) -> ConfigResult<Option<Value>> {
        let store = self.declared_store(def)?;
        trace!(store = %def.store(), field = %def.path(), "reading field");
        store.lookup_field(def.path()).map_err(|source| ConfigError::Store {
            store: def.store().clone(),
            source,
        })
    }

    /// Looks a declared field up by store name and path and returns its stored
    /// value, or its encoded default when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownField`] if no such field is declared and
    /// [`ConfigError::KeyNotFound`] if it has neither a value nor a default.
    pub fn get_dyn(&self, store: &str, path: &FieldPath) -> ConfigResult<Value> {
        let Some(def) = self.schema.field(store, path) else {
            return Err(ConfigError::UnknownField {
                schema: self.schema.name().to_owned(),
                store: Key::new(store).map_err(|_| ConfigError::UnknownStore {
                    schema: self.schema.name().to_owned(),
                    store: store.to_owned(),
                })?,
                path: path.clone(),
            });
        };
        match self.get_raw(def)? {
            Some(raw) => Ok(raw),
            None => def.default_raw().cloned().ok_or_else(|| ConfigError::KeyNotFound {
                store: def.store().clone(),
                path: def.path().clone(),
            }),
        }
    }

    /// Writes `value` to `field`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Immutable`] while the instance is locked, in
    /// which case the store is left untouched. Also fails with
    /// [`ConfigError::Codec`] if the value cannot be encoded and with
    /// [`ConfigError::Store`] if the store rejects it.
    pub fn set<T: 'static>(&mut self, field: &Field<T>, value: T) -> ConfigResult<()> {
        self.ensure_unlocked(|| format!("{}/{}", field.store(), field.path()))?;
        self.declared_store(field.def())?;
        let encoded = field.encode(&value).map_err(|source| ConfigError::Codec {
            path: field.path().clone(),
            source,
        })?;
        let store_error = |source| ConfigError::Store {
            store: field.store().clone(),
            source,
        };
        let store = self.slot_mut(field.store())?;
        trace!(store = %field.store(), field = %field.path(), "writing field");
        store.assign(field.path(), encoded).map_err(store_error)
    }

    /// Returns the stored subtree under `section`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KeyNotFound`] when nothing is stored under the
    /// section and [`ConfigError::UnknownStore`] when its store was not
    /// declared.
    pub fn section(&self, section: &Section) -> ConfigResult<Value> {
        let store = self
            .stores
            .get(section.store().as_str())
            .ok_or_else(|| self.unknown_store(section.store().as_str()))?;
        store
            .lookup(section.path())
            .map_err(|source| ConfigError::Store {
                store: section.store().clone(),
                source,
            })?
            .ok_or_else(|| ConfigError::KeyNotFound {
                store: section.store().clone(),
                path: section.path().clone(),
            })
    }

    /// Read-only view of the store installed under `name`.
    #[must_use]
    pub fn store(&self, name: &str) -> Option<&dyn Store> {
        self.stores.get(name)
    }

    /// Mutable access to the store installed under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Immutable`] while the instance is locked and
    /// [`ConfigError::UnknownStore`] if `name` was not declared.
    pub fn store_mut(&mut self, name: &str) -> ConfigResult<&mut (dyn Store + 'static)> {
        self.ensure_unlocked(|| name.to_owned())?;
        let schema = self.schema.name().to_owned();
        self.stores
            .get_mut(name)
            .ok_or_else(|| ConfigError::UnknownStore {
                schema,
                store: name.to_owned(),
            })
    }

    /// Renders every store as one JSON object keyed by store name.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        let stores: Map<String, Value> = self
            .stores
            .iter()
            .map(|(name, store)| (name.to_string(), store.snapshot()))
            .collect();
        Value::Object(stores)
    }

    fn ensure_unlocked(&self, target: impl FnOnce() -> String) -> ConfigResult<()> {
        if !self.is_locked() {
            return Ok(());
        }
        let target = target();
        warn!(schema = %self.schema.name(), %target, "rejected write to locked config");
        Err(ConfigError::Immutable {
            schema: self.schema.name().to_owned(),
            target,
        })
    }

    fn declared_store(&self, def: &FieldDef) -> ConfigResult<&dyn Store> {
        if self.schema.field(def.store().as_str(), def.path()).is_none() {
            return Err(ConfigError::UnknownField {
                schema: self.schema.name().to_owned(),
                store: def.store().clone(),
                path: def.path().clone(),
            });
        }
        self.stores
            .get(def.store().as_str())
            .ok_or_else(|| self.unknown_store(def.store().as_str()))
    }

    fn slot_mut(&mut self, store: &Key) -> ConfigResult<&mut (dyn Store + 'static)> {
        let schema = self.schema.name().to_owned();
        self.stores
            .get_mut(store.as_str())
            .ok_or_else(|| ConfigError::UnknownStore {
                schema,
                store: store.to_string(),
            })
    }

    fn unknown_store(&self, store: &str) -> ConfigError {
        ConfigError::UnknownStore {
            schema: self.schema.name().to_owned(),
            store: store.to_owned(),
        }
    }
}

/// Keeps a [`Config`] unlocked; relocks it when dropped.
#[derive(Debug)]
pub struct UnlockGuard<'a> {
    config: &'a mut Config,
}

impl Deref for UnlockGuard<'_> {
    type Target = Config;

    fn deref(&self) -> &Config {
        self.config
    }
}

impl DerefMut for UnlockGuard<'_> {
    fn deref_mut(&mut self) -> &mut Config {
        self.config
    }
}

impl Drop for UnlockGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.config.lock() {
            warn!(schema = %self.config.schema.name(), %err, "failed to relock config");
        }
    }
}
