//! Snapshot of process environment variables.

use std::collections::BTreeMap;

use bonfig_primitives::FieldPath;
use serde_json::Value;
use tracing::debug;

use crate::error::{StoreError, StoreResult, value_kind};
use crate::Store;

const KIND: &str = "env";

/// Flat, string-only store holding a copy of environment variables.
///
/// The snapshot is taken once; later changes to the process environment are
/// not observed, and writes only touch the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvStore {
    vars: BTreeMap<String, String>,
}

impl EnvStore {
    /// Captures every variable of the current process.
    ///
    /// Variables whose name or value is not valid unicode are skipped.
    #[must_use]
    pub fn capture() -> Self {
        Self::from_vars(std::env::vars_os().filter_map(|(name, value)| {
            Some((name.into_string().ok()?, value.into_string().ok()?))
        }))
    }

    /// Captures variables starting with `prefix`, stripping it from the names.
    #[must_use]
    pub fn capture_prefixed(prefix: &str) -> Self {
        let store = Self::from_vars(std::env::vars_os().filter_map(|(name, value)| {
            let name = name.into_string().ok()?;
            let stripped = name.strip_prefix(prefix)?;
            if stripped.is_empty() {
                return None;
            }
            Some((stripped.to_owned(), value.into_string().ok()?))
        }));
        debug!(prefix, captured = store.len(), "captured prefixed environment");
        store
    }

    /// Builds a snapshot from explicit name/value pairs.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    /// Number of captured variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns `true` when no variables were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    fn variable<'p>(path: &'p FieldPath) -> StoreResult<&'p str> {
        match path.keys() {
            [name] => Ok(name.as_str()),
            _ => Err(StoreError::UnsupportedPath {
                kind: KIND,
                path: path.clone(),
                reason: "environment variables are not nested",
            }),
        }
    }
}

impl Store for EnvStore {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn lookup(&self, path: &FieldPath) -> StoreResult<Option<Value>> {
        let name = Self::variable(path)?;
        Ok(self.vars.get(name).map(|value| Value::String(value.clone())))
    }

    fn assign(&mut self, path: &FieldPath, value: Value) -> StoreResult<()> {
        let name = Self::variable(path)?;
        match value {
            Value::String(value) => {
                self.vars.insert(name.to_owned(), value);
                Ok(())
            }
            other => Err(StoreError::UnsupportedValue {
                kind: KIND,
                path: path.clone(),
                found: value_kind(&other),
            }),
        }
    }

    fn snapshot(&self) -> Value {
        Value::Object(
            self.vars
                .iter()
                .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                .collect(),
        )
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
    fn reads_and_writes_flat_variables() {
        let mut store = EnvStore::from_vars([("HOME", "/root")]);
        assert_eq!(store.lookup(&path(&["HOME"])).unwrap(), Some(json!("/root")));
        assert_eq!(store.lookup(&path(&["MISSING"])).unwrap(), None);

        store.assign(&path(&["EDITOR"]), json!("vi")).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.snapshot(), json!({ "EDITOR": "vi", "HOME": "/root" }));
    }

    #[test]
    fn nested_paths_are_rejected() {
        let store = EnvStore::default();
        let err = store.lookup(&path(&["A", "b"])).expect_err("nested");
        assert!(matches!(err, StoreError::UnsupportedPath { kind: "env", .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn only_strings_are_accepted() {
        let mut store = EnvStore::default();
        let err = store
            .assign(&path(&["PORT"]), json!(8080))
            .expect_err("number");
        assert!(matches!(err, StoreError::UnsupportedValue { .. }));
    }

    #[test]
    fn capture_sees_process_environment() {
        // cargo exports package metadata to test processes.
        let store = EnvStore::capture();
        assert!(store.contains(&path(&["CARGO_PKG_NAME"])).unwrap());

        let prefixed = EnvStore::capture_prefixed("CARGO_PKG_");
        assert_eq!(
            prefixed.lookup(&path(&["NAME"])).unwrap(),
            Some(json!("bonfig-store"))
        );
    }
}
