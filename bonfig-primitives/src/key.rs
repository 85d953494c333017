//! Key segments used to address values inside a store.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MAX_KEY_LEN: usize = 256;

/// A single, validated segment of a [`crate::FieldPath`].
///
/// Keys are arbitrary non-empty strings (spaces are allowed, so
/// `"A Really Long Descriptive Name"` is a valid key) but may not contain
/// control characters.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key(String);

impl Key {
    /// Creates a new key after validating its format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if the supplied key is empty, too long, or
    /// contains control characters.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self(key))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a copy of the key with ASCII letters lower-cased.
    #[must_use]
    pub fn to_ascii_lowercase(&self) -> Self {
        Self(self.0.to_ascii_lowercase())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<Key> for String {
    fn from(value: Key) -> Self {
        value.0
    }
}

impl TryFrom<String> for Key {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Key {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidKey {
            key: String::new(),
            reason: "key cannot be empty".into(),
        });
    }

    if key.len() > MAX_KEY_LEN {
        return Err(Error::InvalidKey {
            key: key.into(),
            reason: format!("key length must be <= {MAX_KEY_LEN}"),
        });
    }

    if key.chars().any(char::is_control) {
        return Err(Error::InvalidKey {
            key: key.escape_debug().to_string(),
            reason: "key must not contain control characters".into(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_spaces_and_punctuation() {
        let key = Key::new("Out on a limb").expect("key");
        assert_eq!(key.as_str(), "Out on a limb");
        assert_eq!(key.to_string(), "Out on a limb");
    }

    #[test]
    fn rejects_empty_key() {
        let err = Key::new("").expect_err("empty key");
        assert!(matches!(err, Error::InvalidKey { .. }));
    }

    #[test]
    fn rejects_control_characters() {
        let err = Key::new("line\nbreak").expect_err("control char");
        assert!(matches!(err, Error::InvalidKey { ref key, .. } if key == "line\\nbreak"));
    }

    #[test]
    fn rejects_overlong_key() {
        let err = Key::new("k".repeat(MAX_KEY_LEN + 1)).expect_err("too long");
        assert!(matches!(err, Error::InvalidKey { .. }));
    }

    #[test]
    fn deserialize_validates() {
        let key: Key = serde_json::from_str("\"Output\"").unwrap();
        assert_eq!(key.as_str(), "Output");
        assert!(serde_json::from_str::<Key>("\"\"").is_err());
    }
}
