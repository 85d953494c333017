//! Field declarations and typed field handles.

use std::fmt;
use std::sync::Arc;

use bonfig_primitives::{FieldPath, Key};
use serde_json::Value;

use crate::codec::{Bool, Codec, Delimited, Float, Int, Raw, Text};
use crate::error::{CodecResult, SchemaError, SchemaResult};

/// Type-erased description of a declared field, shared by every handle and
/// every configuration instance built from the same schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    store: Key,
    path: FieldPath,
    default: Option<Value>,
    type_name: String,
}

impl FieldDef {
    /// Name of the store the field reads from and writes to.
    #[must_use]
    pub fn store(&self) -> &Key {
        &self.store
    }

    /// Full path of the field inside its store.
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Field name, i.e. the last key of its path.
    #[must_use]
    pub fn name(&self) -> &Key {
        self.path.name()
    }

    /// Encoded default, if one was configured.
    #[must_use]
    pub fn default_raw(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Name of the type produced by the field's codec.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

/// Handle to a declared field producing values of type `T`.
///
/// Handles are cheap to clone; all clones share one [`FieldDef`].
pub struct Field<T: 'static> {
    def: Arc<FieldDef>,
    codec: Arc<dyn Codec<Value = T>>,
}

impl<T: 'static> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self {
            def: Arc::clone(&self.def),
            codec: Arc::clone(&self.codec),
        }
    }
}

impl<T: 'static> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("store", &self.def.store.as_str())
            .field("path", &self.def.path.to_string())
            .field("type", &self.def.type_name)
            .finish()
    }
}

impl<T: 'static> Field<T> {
    pub(crate) fn from_parts(def: Arc<FieldDef>, codec: Arc<dyn Codec<Value = T>>) -> Self {
        Self { def, codec }
    }

    /// Shared definition of this field.
    #[must_use]
    pub fn def(&self) -> &Arc<FieldDef> {
        &self.def
    }

    /// Store name.
    #[must_use]
    pub fn store(&self) -> &Key {
        &self.def.store
    }

    /// Path inside the store.
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.def.path
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &Key {
        self.def.name()
    }

    /// Returns `true` if a default was configured.
    #[must_use]
    pub fn has_default(&self) -> bool {
        self.def.default.is_some()
    }

    /// Applies the pre-write transform.
    ///
    /// # Errors
    ///
    /// Propagates codec failures.
    pub fn encode(&self, value: &T) -> CodecResult<Value> {
        self.codec.encode(value)
    }

    /// Applies the post-read transform.
    ///
    /// # Errors
    ///
    /// Propagates codec failures.
    pub fn decode(&self, raw: Value) -> CodecResult<T> {
        self.codec.decode(raw)
    }

    /// Decodes the configured default, if any.
    ///
    /// # Errors
    ///
    /// Propagates codec failures.
    pub fn default_value(&self) -> CodecResult<Option<T>> {
        self.def
            .default
            .clone()
            .map(|raw| self.codec.decode(raw))
            .transpose()
    }
}

/// Unfinished field declaration; hand it to
/// [`crate::SchemaBuilder::add`] to obtain a [`Field`].
pub struct FieldSpec<T: 'static> {
    store: Key,
    path: FieldPath,
    codec: Arc<dyn Codec<Value = T>>,
    default: Option<T>,
}

impl<T: 'static> fmt::Debug for FieldSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("store", &self.store.as_str())
            .field("path", &self.path.to_string())
            .field("type", &self.codec.type_name())
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

impl<T: 'static> FieldSpec<T> {
    /// Starts a declaration at `path` in `store`, using `codec`.
    pub fn new<C>(store: Key, path: FieldPath, codec: C) -> Self
    where
        C: Codec<Value = T>,
    {
        Self::with_shared_codec(store, path, Arc::new(codec))
    }

    /// Starts a declaration with an already shared codec.
    #[must_use]
    pub fn with_shared_codec(store: Key, path: FieldPath, codec: Arc<dyn Codec<Value = T>>) -> Self {
        Self {
            store,
            path,
            codec,
            default: None,
        }
    }

    /// Sets the default materialised when the store holds no value.
    #[must_use]
    pub fn default(mut self, value: impl Into<T>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Renames the field, keeping its section prefix.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidKey`] if `name` is not a valid key.
    pub fn named(mut self, name: &str) -> SchemaResult<Self> {
        let name = Key::new(name)?;
        self.path = FieldPath::under(self.path.parent(), name);
        Ok(self)
    }

    /// Declared path.
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Store name.
    #[must_use]
    pub fn store(&self) -> &Key {
        &self.store
    }

    pub(crate) fn finish(self) -> SchemaResult<(FieldDef, Arc<dyn Codec<Value = T>>)> {
        let default = match &self.default {
            Some(value) => Some(self.codec.encode(value).map_err(|source| {
                SchemaError::InvalidDefault {
                    path: self.path.clone(),
                    source,
                }
            })?),
            None => None,
        };
        let def = FieldDef {
            store: self.store,
            path: self.path,
            default,
            type_name: self.codec.type_name().to_owned(),
        };
        Ok((def, self.codec))
    }
}

/// Types with a natural codec, usable with [`crate::Section::field`].
///
/// Date-times are not included: their stored form depends on a format string,
/// so they are declared through [`crate::Section::datetime`].
pub trait FieldType: Sized + 'static {
    /// Codec used when none is given explicitly.
    fn default_codec() -> Arc<dyn Codec<Value = Self>>;
}

impl FieldType for Value {
    fn default_codec() -> Arc<dyn Codec<Value = Self>> {
        Arc::new(Raw)
    }
}

impl FieldType for String {
    fn default_codec() -> Arc<dyn Codec<Value = Self>> {
        Arc::new(Text)
    }
}

impl FieldType for bool {
    fn default_codec() -> Arc<dyn Codec<Value = Self>> {
        Arc::new(Bool)
    }
}

impl FieldType for Vec<String> {
    fn default_codec() -> Arc<dyn Codec<Value = Self>> {
        Arc::new(Delimited::default())
    }
}

macro_rules! numeric_field_type {
    ($codec:ident: $($ty:ty),+) => {
        $(
            impl FieldType for $ty {
                fn default_codec() -> Arc<dyn Codec<Value = Self>> {
                    Arc::new($codec::<$ty>::new())
                }
            }
        )+
    };
}

numeric_field_type!(Int: i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
numeric_field_type!(Float: f32, f64);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec<T: FieldType>(segments: &[&str]) -> FieldSpec<T> {
        FieldSpec::with_shared_codec(
            Key::new("d").unwrap(),
            FieldPath::new(segments.iter().copied()).unwrap(),
            T::default_codec(),
        )
    }

    #[test]
    fn finish_encodes_default() {
        let (def, _) = spec::<i64>(&["pin"]).default(1234).finish().unwrap();
        assert_eq!(def.default_raw(), Some(&json!("1234")));
        assert_eq!(def.type_name(), "integer");
        assert_eq!(def.name().as_str(), "pin");
    }

    #[test]
    fn named_keeps_prefix() {
        let renamed = spec::<String>(&["Output", "B"]).named("b").unwrap();
        assert_eq!(renamed.path(), &FieldPath::new(["Output", "b"]).unwrap());
        assert!(spec::<String>(&["x"]).named("").is_err());
    }

    #[test]
    fn handle_decodes_default() {
        let (def, codec) = spec::<bool>(&["flag"]).default(true).finish().unwrap();
        let field = Field::from_parts(Arc::new(def), codec);
        assert_eq!(field.default_value().unwrap(), Some(true));
        assert!(field.has_default());
        assert_eq!(field.clone().path(), field.path());
    }
}
