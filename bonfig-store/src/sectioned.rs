//! Two-level, string-only store in the shape of an INI parser.

use std::collections::BTreeMap;

use bonfig_primitives::{FieldPath, Key};
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult, value_kind};
use crate::Store;

const KIND: &str = "sectioned";

/// Parser-style store: `section -> option -> string`.
///
/// Paths are either one key (a whole section, read only through
/// [`Store::lookup`]) or two keys (section and option). Fields always need
/// both keys. Only string values may be written, so pair it with
/// typed fields that encode to strings. Option names are lower-cased on every
/// access unless [`SectionedStore::case_sensitive`] was used, the way INI
/// parsers normalise them; section names keep their case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionedStore {
    sections: BTreeMap<String, BTreeMap<String, String>>,
    case_sensitive: bool,
}

impl SectionedStore {
    /// Creates an empty store that lower-cases option names.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that keeps option names exactly as given.
    #[must_use]
    pub fn case_sensitive() -> Self {
        Self {
            sections: BTreeMap::new(),
            case_sensitive: true,
        }
    }

    /// Adds an empty section if it does not already exist.
    pub fn add_section(&mut self, section: &Key) {
        self.sections.entry(section.to_string()).or_default();
    }

    /// Inserts an option directly, normalising its name.
    #[must_use]
    pub fn with_option(mut self, section: &Key, option: &Key, value: impl Into<String>) -> Self {
        let option = self.option_name(option);
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(option, value.into());
        self
    }

    /// Returns the section names in sorted order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Returns `true` if the store normalises option names.
    #[must_use]
    pub fn lowercases_options(&self) -> bool {
        !self.case_sensitive
    }

    fn option_name(&self, option: &Key) -> String {
        if self.case_sensitive {
            option.to_string()
        } else {
            option.to_ascii_lowercase().into()
        }
    }

    fn unsupported(path: &FieldPath, reason: &'static str) -> StoreError {
        StoreError::UnsupportedPath {
            kind: KIND,
            path: path.clone(),
            reason,
        }
    }
}

fn section_value(options: &BTreeMap<String, String>) -> Value {
    Value::Object(
        options
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect::<Map<_, _>>(),
    )
}

impl Store for SectionedStore {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn lookup(&self, path: &FieldPath) -> StoreResult<Option<Value>> {
        match path.keys() {
            [section] => Ok(self.sections.get(section.as_str()).map(section_value)),
            [section, option] => Ok(self
                .sections
                .get(section.as_str())
                .and_then(|options| options.get(&self.option_name(option)))
                .map(|value| Value::String(value.clone()))),
            _ => Err(Self::unsupported(path, "paths must be `section/option`")),
        }
    }

    fn lookup_field(&self, path: &FieldPath) -> StoreResult<Option<Value>> {
        match path.keys() {
            [_, _] => self.lookup(path),
            _ => Err(Self::unsupported(path, "fields live at `section/option`")),
        }
    }

    fn assign(&mut self, path: &FieldPath, value: Value) -> StoreResult<()> {
        let [section, option] = path.keys() else {
            return Err(Self::unsupported(
                path,
                "values can only be written at `section/option`",
            ));
        };
        let value = match value {
            Value::String(value) => value,
            other => {
                return Err(StoreError::UnsupportedValue {
                    kind: KIND,
                    path: path.clone(),
                    found: value_kind(&other),
                });
            }
        };
        let option = self.option_name(option);
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(option, value);
        Ok(())
    }

    fn snapshot(&self) -> Value {
        Value::Object(
            self.sections
                .iter()
                .map(|(name, options)| (name.clone(), section_value(options)))
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
    fn option_names_are_lowercased() {
        let mut store = SectionedStore::new();
        store
            .assign(&path(&["Sec A", "Verbose"]), json!("True"))
            .unwrap();

        assert_eq!(store.snapshot(), json!({ "Sec A": { "verbose": "True" } }));
        assert_eq!(
            store.lookup(&path(&["Sec A", "VERBOSE"])).unwrap(),
            Some(json!("True"))
        );
    }

    #[test]
    fn case_sensitive_store_keeps_option_names() {
        let mut store = SectionedStore::case_sensitive();
        store.assign(&path(&["A", "Mixed"]), json!("1")).unwrap();
        assert_eq!(store.lookup(&path(&["A", "mixed"])).unwrap(), None);
        assert!(!store.lowercases_options());
    }

    #[test]
    fn non_string_values_are_rejected() {
        let mut store = SectionedStore::new();
        let err = store
            .assign(&path(&["A", "b"]), json!(1))
            .expect_err("number");
        assert!(matches!(err, StoreError::UnsupportedValue { found: "number", .. }));
        assert_eq!(store.snapshot(), json!({}));
    }

    #[test]
    fn deep_paths_are_rejected() {
        let store = SectionedStore::new();
        let err = store.lookup(&path(&["A", "B", "c"])).expect_err("too deep");
        assert!(matches!(err, StoreError::UnsupportedPath { .. }));

        let mut store = store;
        let err = store
            .assign(&path(&["top"]), json!("x"))
            .expect_err("needs a section");
        assert!(matches!(err, StoreError::UnsupportedPath { .. }));
    }

    #[test]
    fn fields_need_section_and_option() {
        let store = SectionedStore::new().with_option(
            &Key::new("Output").unwrap(),
            &Key::new("a").unwrap(),
            "foo",
        );
        let err = store
            .lookup_field(&path(&["Output"]))
            .expect_err("section is not a field");
        assert!(matches!(err, StoreError::UnsupportedPath { .. }));
        assert!(store.contains(&path(&["Output"])).is_err());
        assert_eq!(
            store.lookup_field(&path(&["Output", "A"])).unwrap(),
            Some(json!("foo"))
        );
    }

    #[test]
    fn section_lookup_returns_options() {
        let section = Key::new("Output").unwrap();
        let mut store =
            SectionedStore::new().with_option(&section, &Key::new("A").unwrap(), "foo");
        store.add_section(&Key::new("Empty").unwrap());
        assert_eq!(store.section_names().collect::<Vec<_>>(), ["Empty", "Output"]);
        assert_eq!(store.lookup(&path(&["Empty"])).unwrap(), Some(json!({})));
        assert_eq!(
            store.lookup(&path(&["Output"])).unwrap(),
            Some(json!({ "a": "foo" }))
        );
        assert_eq!(store.lookup(&path(&["Missing"])).unwrap(), None);
    }
}
