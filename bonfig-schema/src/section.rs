//! Store declarations and sections: declaration-time path bookkeeping.

use std::sync::Arc;

use bonfig_primitives::{FieldPath, Key};
use chrono::NaiveDateTime;
use serde_json::Value;

use crate::codec::{Codec, DateTime, Delimited};
use crate::error::SchemaResult;
use crate::field::{FieldSpec, FieldType};
use crate::registry::{Dynamic, KindRegistry};

/// Named placeholder for a store, obtained from
/// [`crate::SchemaBuilder::store`]. Fields declared through it live at the
/// top level of that store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreRef {
    name: Key,
}

/// Named grouping inside a store. Every field or section declared through it
/// gets the section's path as a prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Section {
    store: Key,
    path: FieldPath,
}

impl StoreRef {
    pub(crate) fn new(name: Key) -> Self {
        Self { name }
    }

    /// Store name.
    #[must_use]
    pub fn name(&self) -> &Key {
        &self.name
    }

    fn spec<T: 'static>(&self, name: &str, codec: Arc<dyn Codec<Value = T>>) -> SchemaResult<FieldSpec<T>> {
        let path = FieldPath::single(Key::new(name)?);
        Ok(FieldSpec::with_shared_codec(self.name.clone(), path, codec))
    }

    /// Declares a top-level section.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SchemaError::InvalidKey`] if `name` is not a valid key.
    pub fn section(&self, name: &str) -> SchemaResult<Section> {
        Ok(Section {
            store: self.name.clone(),
            path: FieldPath::single(Key::new(name)?),
        })
    }

    /// Declares a field at an explicit path relative to the store root.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SchemaError::InvalidKey`] if the path is empty or any
    /// segment is invalid.
    pub fn at<T: FieldType, I, S>(&self, segments: I) -> SchemaResult<FieldSpec<T>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path = FieldPath::new(segments)?;
        Ok(FieldSpec::with_shared_codec(
            self.name.clone(),
            path,
            T::default_codec(),
        ))
    }
}

impl Section {
    /// Store the section belongs to.
    #[must_use]
    pub fn store(&self) -> &Key {
        &self.store
    }

    /// Full path of the section, outermost key first.
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Section name, i.e. the last key of its path.
    #[must_use]
    pub fn name(&self) -> &Key {
        self.path.name()
    }

    fn spec<T: 'static>(&self, name: &str, codec: Arc<dyn Codec<Value = T>>) -> SchemaResult<FieldSpec<T>> {
        let path = self.path.child(Key::new(name)?);
        Ok(FieldSpec::with_shared_codec(self.store.clone(), path, codec))
    }

    /// Declares a nested section.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SchemaError::InvalidKey`] if `name` is not a valid key.
    pub fn section(&self, name: &str) -> SchemaResult<Section> {
        Ok(Section {
            store: self.store.clone(),
            path: self.path.child(Key::new(name)?),
        })
    }
}

macro_rules! declaration_methods {
    ($owner:ty) => {
        impl $owner {
            /// Declares a field using the natural codec of `T`.
            ///
            /// # Errors
            ///
            /// Returns [`crate::SchemaError::InvalidKey`] if `name` is not a valid key.
            pub fn field<T: FieldType>(&self, name: &str) -> SchemaResult<FieldSpec<T>> {
                self.spec(name, T::default_codec())
            }

            /// Declares a field with an explicit codec.
            ///
            /// # Errors
            ///
            /// Returns [`crate::SchemaError::InvalidKey`] if `name` is not a valid key.
            pub fn with_codec<C: Codec>(&self, name: &str, codec: C) -> SchemaResult<FieldSpec<C::Value>> {
                self.spec(name, Arc::new(codec))
            }

            /// Declares an untyped field holding raw JSON values.
            ///
            /// # Errors
            ///
            /// Returns [`crate::SchemaError::InvalidKey`] if `name` is not a valid key.
            pub fn raw(&self, name: &str) -> SchemaResult<FieldSpec<Value>> {
                self.field(name)
            }

            /// Declares a string field.
            ///
            /// # Errors
            ///
            /// Returns [`crate::SchemaError::InvalidKey`] if `name` is not a valid key.
            pub fn text(&self, name: &str) -> SchemaResult<FieldSpec<String>> {
                self.field(name)
            }

            /// Declares an `i64` field stored as text.
            ///
            /// # Errors
            ///
            /// Returns [`crate::SchemaError::InvalidKey`] if `name` is not a valid key.
            pub fn int(&self, name: &str) -> SchemaResult<FieldSpec<i64>> {
                self.field(name)
            }

            /// Declares an `f64` field stored as text.
            ///
            /// # Errors
            ///
            /// Returns [`crate::SchemaError::InvalidKey`] if `name` is not a valid key.
            pub fn float(&self, name: &str) -> SchemaResult<FieldSpec<f64>> {
                self.field(name)
            }

            /// Declares a boolean field stored as `"True"`/`"False"`.
            ///
            /// # Errors
            ///
            /// Returns [`crate::SchemaError::InvalidKey`] if `name` is not a valid key.
            pub fn boolean(&self, name: &str) -> SchemaResult<FieldSpec<bool>> {
                self.field(name)
            }

            /// Declares a date-time field stored using `format`.
            ///
            /// # Errors
            ///
            /// Returns [`crate::SchemaError::InvalidKey`] for a bad name and
            /// [`crate::SchemaError::Codec`] for a bad format string.
            pub fn datetime(&self, name: &str, format: &str) -> SchemaResult<FieldSpec<NaiveDateTime>> {
                self.with_codec(name, DateTime::new(format)?)
            }

            /// Declares a list field joined with `separator`.
            ///
            /// # Errors
            ///
            /// Returns [`crate::SchemaError::InvalidKey`] if `name` is not a valid key.
            pub fn list(&self, name: &str, separator: &str) -> SchemaResult<FieldSpec<Vec<String>>> {
                self.with_codec(name, Delimited::new(separator))
            }

            /// Declares a field of a kind registered in `registry`.
            ///
            /// # Errors
            ///
            /// Returns [`crate::SchemaError::UnknownKind`] when the kind is not
            /// registered and [`crate::SchemaError::InvalidKey`] for a bad name.
            pub fn kind(&self, registry: &KindRegistry, kind: &str, name: &str) -> SchemaResult<FieldSpec<Value>> {
                let codec = Dynamic::new(registry.get(kind)?);
                self.with_codec(name, codec)
            }
        }
    };
}

declaration_methods!(StoreRef);
declaration_methods!(Section);

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> StoreRef {
        StoreRef::new(Key::new("d").unwrap())
    }

    #[test]
    fn nested_sections_concatenate_outermost_first() {
        let inner = store()
            .section("A")
            .and_then(|s| s.section("B"))
            .and_then(|s| s.section("C"))
            .unwrap();
        let spec = inner.int("leaf").unwrap();
        assert_eq!(spec.path(), &FieldPath::new(["A", "B", "C", "leaf"]).unwrap());
        assert_eq!(spec.store().as_str(), "d");
        assert_eq!(inner.name().as_str(), "C");
    }

    #[test]
    fn store_level_fields_are_top_level() {
        let spec = store().text("a").unwrap();
        assert_eq!(spec.path(), &FieldPath::new(["a"]).unwrap());

        let spec = store().at::<String, _, _>(["Out on a limb", "lonely"]).unwrap();
        assert_eq!(spec.path().len(), 2);
    }

    #[test]
    fn invalid_names_are_rejected() {
        assert!(store().section("").is_err());
        assert!(store().section("ok").unwrap().boolean("").is_err());
    }

    #[test]
    fn bad_datetime_format_is_rejected() {
        let err = store().datetime("when", "%Q").expect_err("bad format");
        assert!(matches!(err, crate::SchemaError::Codec(_)));
    }

    #[test]
    fn kinds_resolve_through_sections() {
        let registry = KindRegistry::new();
        let section = store().section("Output").unwrap();
        let spec = section.kind(&registry, "IntField", "c").unwrap();
        assert_eq!(spec.path(), &FieldPath::new(["Output", "c"]).unwrap());
        assert!(matches!(
            section.kind(&registry, "NopeField", "c"),
            Err(crate::SchemaError::UnknownKind { .. })
        ));
    }
}
