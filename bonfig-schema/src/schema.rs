//! Schema collection: the set of declared stores and fields.

use std::sync::Arc;

use bonfig_primitives::{FieldPath, Key};
use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::field::{Field, FieldDef, FieldSpec};
use crate::section::StoreRef;

/// Immutable description of a configuration: every declared store name and
/// every declared field. Shared by all instances built from it.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    stores: Vec<Key>,
    fields: Vec<Arc<FieldDef>>,
}

impl Schema {
    /// Starts building a schema.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            stores: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Schema name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared store names, in declaration order.
    #[must_use]
    pub fn stores(&self) -> &[Key] {
        &self.stores
    }

    /// Returns `true` if `store` was declared.
    #[must_use]
    pub fn has_store(&self, store: &str) -> bool {
        self.stores.iter().any(|declared| declared.as_str() == store)
    }

    /// Every declared field, in declaration order (inherited fields first).
    #[must_use]
    pub fn fields(&self) -> &[Arc<FieldDef>] {
        &self.fields
    }

    /// Fields bound to `store`.
    pub fn fields_in<'a>(&'a self, store: &'a str) -> impl Iterator<Item = &'a Arc<FieldDef>> + 'a {
        self.fields
            .iter()
            .filter(move |def| def.store().as_str() == store)
    }

    /// Looks up a field by store and path.
    #[must_use]
    pub fn field(&self, store: &str, path: &FieldPath) -> Option<&Arc<FieldDef>> {
        self.fields
            .iter()
            .find(|def| def.store().as_str() == store && def.path() == path)
    }
}

/// Builder for [`Schema`]; validates every declaration as it is added.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    stores: Vec<Key>,
    fields: Vec<Arc<FieldDef>>,
}

impl SchemaBuilder {
    /// Declares a store, or returns the existing declaration of that name.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidKey`] if `name` is not a valid key.
    pub fn store(&mut self, name: &str) -> SchemaResult<StoreRef> {
        let key = Key::new(name)?;
        if !self.stores.contains(&key) {
            debug!(schema = %self.name, store = %key, "declared store");
            self.stores.push(key.clone());
        }
        Ok(StoreRef::new(key))
    }

    /// Adds a field declaration and returns its typed handle.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownStore`] if the field's store was not
    /// declared on this builder, [`SchemaError::DuplicateField`] or
    /// [`SchemaError::PathConflict`] if it collides with an earlier field, and
    /// [`SchemaError::InvalidDefault`] if its default cannot be encoded.
    pub fn add<T: 'static>(&mut self, spec: FieldSpec<T>) -> SchemaResult<Field<T>> {
        let (def, codec) = spec.finish()?;
        let def = Arc::new(def);
        self.insert(Arc::clone(&def))?;
        Ok(Field::from_parts(def, codec))
    }

    /// Copies every store and field of `base` into this builder.
    ///
    /// Field handles obtained from `base` keep working against instances of
    /// the extended schema. `base` itself is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateField`] or [`SchemaError::PathConflict`]
    /// if a field of `base` collides with one already declared here.
    pub fn extend(&mut self, base: &Schema) -> SchemaResult<&mut Self> {
        for store in &base.stores {
            if !self.stores.contains(store) {
                self.stores.push(store.clone());
            }
        }
        for def in &base.fields {
            self.insert(Arc::clone(def))?;
        }
        debug!(schema = %self.name, base = %base.name, "extended schema");
        Ok(self)
    }

    fn insert(&mut self, def: Arc<FieldDef>) -> SchemaResult<()> {
        if !self.stores.contains(def.store()) {
            return Err(SchemaError::UnknownStore {
                schema: self.name.clone(),
                store: def.store().clone(),
            });
        }

        for existing in self.fields.iter().filter(|f| f.store() == def.store()) {
            if Arc::ptr_eq(existing, &def) {
                // Same declaration reached through two bases.
                return Ok(());
            }
            if existing.path() == def.path() {
                return Err(SchemaError::DuplicateField {
                    store: def.store().clone(),
                    path: def.path().clone(),
                });
            }
            if existing.path().is_strict_prefix_of(def.path())
                || def.path().is_strict_prefix_of(existing.path())
            {
                return Err(SchemaError::PathConflict {
                    store: def.store().clone(),
                    existing: existing.path().clone(),
                    new: def.path().clone(),
                });
            }
        }

        debug!(
            schema = %self.name,
            store = %def.store(),
            field = %def.path(),
            kind = def.type_name(),
            "declared field"
        );
        self.fields.push(def);
        Ok(())
    }

    /// Finalises the schema.
    #[must_use]
    pub fn build(self) -> Schema {
        Schema {
            name: self.name,
            stores: self.stores,
            fields: self.fields,
        }
    }
}

/// Implemented by structs of field handles, usually through
/// `#[derive(Bonfig)]`.
pub trait Declare: Sized {
    /// Name used for the schema built by [`Declare::schema`].
    const SCHEMA_NAME: &'static str;

    /// Declares every field of `Self` on `builder` and returns the handles.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if any declaration is rejected.
    fn declare(builder: &mut SchemaBuilder) -> SchemaResult<Self>;

    /// Builds a standalone schema for `Self`, returning it with the handles.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if any declaration is rejected.
    fn schema() -> SchemaResult<(Schema, Self)> {
        let mut builder = Schema::builder(Self::SCHEMA_NAME);
        let fields = Self::declare(&mut builder)?;
        Ok((builder.build(), fields))
    }
}
