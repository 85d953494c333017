//! Nested JSON-object store.

use bonfig_primitives::FieldPath;
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{StoreError, StoreResult, value_kind};
use crate::Store;

/// Store backed by a tree of JSON objects.
///
/// Each path segment but the last selects a nested object; writes create
/// missing intermediate objects. Values of any JSON type may be stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    root: Map<String, Value>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRoot`] when `value` is not an object.
    pub fn from_value(value: Value) -> StoreResult<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(StoreError::InvalidRoot {
                found: value_kind(&other),
            }),
        }
    }

    /// Returns the underlying object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Consumes the store, returning the document as a JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }
}

impl From<Map<String, Value>> for MemoryStore {
    fn from(root: Map<String, Value>) -> Self {
        Self { root }
    }
}

impl Store for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn lookup(&self, path: &FieldPath) -> StoreResult<Option<Value>> {
        let mut current = &self.root;
        for key in path.parent() {
            match current.get(key.as_str()) {
                Some(Value::Object(next)) => current = next,
                Some(_) => {
                    return Err(StoreError::NotAContainer {
                        path: path.clone(),
                        at: key.to_string(),
                    });
                }
                None => {
                    trace!(%path, missing = %key, "memory store lookup miss");
                    return Ok(None);
                }
            }
        }
        Ok(current.get(path.name().as_str()).cloned())
    }

    fn assign(&mut self, path: &FieldPath, value: Value) -> StoreResult<()> {
        let mut current = &mut self.root;
        for key in path.parent() {
            let slot = current
                .entry(key.as_str())
                .or_insert_with(|| Value::Object(Map::new()));
            current = match slot {
                Value::Object(next) => next,
                _ => {
                    return Err(StoreError::NotAContainer {
                        path: path.clone(),
                        at: key.to_string(),
                    });
                }
            };
        }
        current.insert(path.name().to_string(), value);
        Ok(())
    }

    fn snapshot(&self) -> Value {
        Value::Object(self.root.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> FieldPath {
        FieldPath::new(segments.iter().copied()).unwrap()
    }

    #[test]
    fn assign_creates_intermediate_objects() {
        let mut store = MemoryStore::new();
        store
            .assign(&path(&["Alpha", "a"]), json!("aye"))
            .unwrap();
        store
            .assign(&path(&["Alpha", "b"]), json!("bee"))
            .unwrap();

        assert_eq!(
            store.snapshot(),
            json!({ "Alpha": { "a": "aye", "b": "bee" } })
        );
    }

    #[test]
    fn lookup_missing_segment_is_none() {
        let store = MemoryStore::from_value(json!({ "a": 1 })).unwrap();
        assert_eq!(store.lookup(&path(&["b", "c"])).unwrap(), None);
        assert_eq!(store.lookup(&path(&["a"])).unwrap(), Some(json!(1)));
    }

    #[test]
    fn lookup_of_section_returns_subtree() {
        let store = MemoryStore::from_value(json!({ "lists": { "even": "2, 4" } })).unwrap();
        assert_eq!(
            store.lookup(&path(&["lists"])).unwrap(),
            Some(json!({ "even": "2, 4" }))
        );
    }

    #[test]
    fn walking_through_scalar_errors() {
        let mut store = MemoryStore::from_value(json!({ "a": 1 })).unwrap();
        let err = store.lookup(&path(&["a", "b"])).expect_err("scalar parent");
        assert!(matches!(err, StoreError::NotAContainer { ref at, .. } if at == "a"));

        let err = store
            .assign(&path(&["a", "b"]), json!(2))
            .expect_err("scalar parent");
        assert!(matches!(err, StoreError::NotAContainer { .. }));
        assert_eq!(store.snapshot(), json!({ "a": 1 }));
    }

    #[test]
    fn non_object_root_is_rejected() {
        let err = MemoryStore::from_value(json!([1, 2])).expect_err("array root");
        assert!(matches!(err, StoreError::InvalidRoot { found: "array" }));
    }
}
