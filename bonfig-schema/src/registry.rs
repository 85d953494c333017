//! Runtime registry of named field kinds.
//!
//! A field kind is a dynamically typed codec (`Value -> Value` in both
//! directions) registered under a name such as `"IntField"`. Sections look
//! kinds up by name, so new kinds can be attached at runtime without touching
//! the core field types.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::codec::{Bool, Codec, DateTime, Float, Int, Raw};
use crate::error::{CodecError, CodecResult, SchemaError, SchemaResult};

/// Dynamically typed codec stored in a [`KindRegistry`].
pub trait DynCodec: fmt::Debug + Send + Sync {
    /// Name of the produced type, used in error messages.
    fn type_name(&self) -> &str;

    /// Transform applied before a value is written.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] when the value cannot be stored.
    fn pre_write(&self, value: Value) -> CodecResult<Value>;

    /// Transform applied after a value is read.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] when the stored value cannot be interpreted.
    fn post_read(&self, raw: Value) -> CodecResult<Value>;
}

/// Adapts a typed [`Codec`] into a [`DynCodec`] through serde.
#[derive(Debug, Clone, Copy, Default)]
pub struct Erased<C>(pub C);

impl<C> DynCodec for Erased<C>
where
    C: Codec + fmt::Debug,
    C::Value: Serialize + DeserializeOwned,
{
    fn type_name(&self) -> &str {
        self.0.type_name()
    }

    fn pre_write(&self, value: Value) -> CodecResult<Value> {
        let typed: C::Value = serde_json::from_value(value.clone())
            .map_err(|err| CodecError::parse(self.0.type_name(), value.to_string(), err))?;
        self.0.encode(&typed)
    }

    fn post_read(&self, raw: Value) -> CodecResult<Value> {
        let typed = self.0.decode(raw)?;
        serde_json::to_value(typed)
            .map_err(|err| CodecError::parse(self.0.type_name(), "<decoded value>", err))
    }
}

type Transform = dyn Fn(Value) -> CodecResult<Value> + Send + Sync;

/// Kind built from a pair of plain functions.
pub struct QuickKind {
    name: String,
    post_read: Box<Transform>,
    pre_write: Box<Transform>,
}

impl QuickKind {
    /// Creates a kind from its post-read and pre-write transforms.
    pub fn new<R, W>(name: impl Into<String>, post_read: R, pre_write: W) -> Self
    where
        R: Fn(Value) -> CodecResult<Value> + Send + Sync + 'static,
        W: Fn(Value) -> CodecResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            post_read: Box::new(post_read),
            pre_write: Box::new(pre_write),
        }
    }
}

impl fmt::Debug for QuickKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuickKind").field("name", &self.name).finish()
    }
}

impl DynCodec for QuickKind {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn pre_write(&self, value: Value) -> CodecResult<Value> {
        (self.pre_write)(value)
    }

    fn post_read(&self, raw: Value) -> CodecResult<Value> {
        (self.post_read)(raw)
    }
}

/// Typed view over a [`DynCodec`], used by fields created from a kind.
#[derive(Clone)]
pub struct Dynamic(Arc<dyn DynCodec>);

impl Dynamic {
    /// Wraps a registered kind.
    #[must_use]
    pub fn new(kind: Arc<dyn DynCodec>) -> Self {
        Self(kind)
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dynamic").field(&self.0.type_name()).finish()
    }
}

impl Codec for Dynamic {
    type Value = Value;

    fn type_name(&self) -> &str {
        self.0.type_name()
    }

    fn encode(&self, value: &Value) -> CodecResult<Value> {
        self.0.pre_write(value.clone())
    }

    fn decode(&self, raw: Value) -> CodecResult<Value> {
        self.0.post_read(raw)
    }
}

/// Registry that stores field kinds keyed by name.
///
/// [`KindRegistry::new`] comes pre-populated with `Field`, `IntField`,
/// `FloatField`, `BoolField` and `DatetimeField`. `DatetimeField` always uses
/// [`DateTime::ISO_FORMAT`]; other formats go through
/// [`crate::Section::datetime`].
pub struct KindRegistry {
    inner: RwLock<BTreeMap<String, Arc<dyn DynCodec>>>,
}

impl fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindRegistry")
            .field("registered", &self.names())
            .finish()
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl KindRegistry {
    /// Creates a registry holding the built-in kinds.
    #[must_use]
    pub fn new() -> Self {
        let mut builtins: BTreeMap<String, Arc<dyn DynCodec>> = BTreeMap::new();
        builtins.insert("Field".into(), Arc::new(Erased(Raw)));
        builtins.insert("IntField".into(), Arc::new(Erased(Int::<i64>::new())));
        builtins.insert("FloatField".into(), Arc::new(Erased(Float::<f64>::new())));
        builtins.insert("BoolField".into(), Arc::new(Erased(Bool)));
        builtins.insert("DatetimeField".into(), Arc::new(Erased(DateTime::iso())));
        Self {
            inner: RwLock::new(builtins),
        }
    }

    /// Creates a registry without any kinds.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }

    /// Registers a kind under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateKind`] if the name is already present.
    pub fn register<K>(&self, name: impl Into<String>, kind: K) -> SchemaResult<()>
    where
        K: DynCodec + 'static,
    {
        let name = name.into();
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.contains_key(&name) {
            return Err(SchemaError::DuplicateKind { name });
        }
        debug!(kind = %name, "registered field kind");
        inner.insert(name, Arc::new(kind));
        Ok(())
    }

    /// Registers a typed codec under `name`, bridging values through serde.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateKind`] if the name is already present.
    pub fn register_codec<C>(&self, name: impl Into<String>, codec: C) -> SchemaResult<()>
    where
        C: Codec + fmt::Debug,
        C::Value: Serialize + DeserializeOwned,
    {
        self.register(name, Erased(codec))
    }

    /// Registers a kind built from a post-read / pre-write function pair.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateKind`] if the name is already present.
    pub fn make_quick<R, W>(&self, name: impl Into<String>, post_read: R, pre_write: W) -> SchemaResult<()>
    where
        R: Fn(Value) -> CodecResult<Value> + Send + Sync + 'static,
        W: Fn(Value) -> CodecResult<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        self.register(name.clone(), QuickKind::new(name, post_read, pre_write))
    }

    /// Returns the kind registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownKind`] when no such kind exists.
    pub fn get(&self, name: &str) -> SchemaResult<Arc<dyn DynCodec>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownKind { name: name.into() })
    }

    /// Lists registered kind names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Delimited;
    use serde_json::json;

    #[test]
    fn builtins_are_registered() {
        let registry = KindRegistry::new();
        assert_eq!(
            registry.names(),
            ["BoolField", "DatetimeField", "Field", "FloatField", "IntField"]
        );
        assert!(KindRegistry::empty().names().is_empty());
    }

    #[test]
    fn erased_int_converts_both_ways() {
        let registry = KindRegistry::new();
        let kind = registry.get("IntField").unwrap();
        assert_eq!(kind.pre_write(json!(1353)).unwrap(), json!("1353"));
        assert_eq!(kind.post_read(json!("1353")).unwrap(), json!(1353));
        assert!(matches!(
            kind.pre_write(json!("not a number")),
            Err(CodecError::Parse { .. })
        ));
    }

    #[test]
    fn datetime_kind_uses_iso_text() {
        let kind = KindRegistry::new().get("DatetimeField").unwrap();
        assert_eq!(
            kind.pre_write(json!("2018-07-01T13:45:02")).unwrap(),
            json!("2018-07-01T13:45:02")
        );
        assert_eq!(
            kind.post_read(json!("2018-07-01T00:00:00")).unwrap(),
            json!("2018-07-01T00:00:00")
        );
        assert!(matches!(
            kind.post_read(json!("01/07/2018")),
            Err(CodecError::Parse { .. })
        ));
    }

    #[test]
    fn register_codec_and_quick_kinds() {
        let registry = KindRegistry::new();
        registry
            .register_codec("ListField", Delimited::default())
            .unwrap();
        registry
            .make_quick(
                "UpperField",
                Ok,
                |value: Value| match value {
                    Value::String(text) => Ok(Value::String(text.to_uppercase())),
                    other => Err(CodecError::unexpected("string", &other)),
                },
            )
            .unwrap();

        let list = registry.get("ListField").unwrap();
        assert_eq!(list.pre_write(json!(["1", "3"])).unwrap(), json!("1, 3"));

        let upper = registry.get("UpperField").unwrap();
        assert_eq!(upper.type_name(), "UpperField");
        assert_eq!(upper.pre_write(json!("foo")).unwrap(), json!("FOO"));
    }

    #[test]
    fn duplicate_kind_errors() {
        let registry = KindRegistry::new();
        let err = registry
            .register_codec("IntField", Int::<i32>::new())
            .expect_err("duplicate");
        assert!(matches!(err, SchemaError::DuplicateKind { name } if name == "IntField"));
    }

    #[test]
    fn unknown_kind_errors() {
        let err = KindRegistry::new().get("Missing").expect_err("unknown");
        assert!(matches!(err, SchemaError::UnknownKind { name } if name == "Missing"));
    }
}
