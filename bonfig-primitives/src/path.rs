//! Field paths: ordered key sequences into a store.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::Key;

/// Non-empty, ordered sequence of [`Key`]s locating a value inside a store.
///
/// The last key is the name of the addressed value; every preceding key names a
/// nested container (a section).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Key>", into = "Vec<Key>")]
pub struct FieldPath(Vec<Key>);

impl FieldPath {
    /// Builds a path from raw string segments, validating each one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] when no segments are supplied and
    /// [`Error::InvalidKey`] when any segment is invalid.
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys = segments
            .into_iter()
            .map(Key::new)
            .collect::<Result<Vec<_>>>()?;
        Self::from_keys(keys)
    }

    /// Builds a path from already validated keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if `keys` is empty.
    pub fn from_keys(keys: Vec<Key>) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::InvalidPath {
                reason: "path must contain at least one key".into(),
            });
        }
        Ok(Self(keys))
    }

    /// Creates a single-segment path.
    #[must_use]
    pub fn single(key: Key) -> Self {
        Self(vec![key])
    }

    /// Returns a new path made of `prefix` followed by `name`.
    #[must_use]
    pub fn under(prefix: &[Key], name: Key) -> Self {
        let mut keys = Vec::with_capacity(prefix.len() + 1);
        keys.extend_from_slice(prefix);
        keys.push(name);
        Self(keys)
    }

    /// Returns the final key, i.e. the name of the addressed value.
    #[must_use]
    pub fn name(&self) -> &Key {
        // Non-empty by construction.
        &self.0[self.0.len() - 1]
    }

    /// Returns every key except the last one.
    #[must_use]
    pub fn parent(&self) -> &[Key] {
        &self.0[..self.0.len() - 1]
    }

    /// Returns all keys in order, outermost first.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    /// Number of keys in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; paths are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns a new path with `key` appended.
    #[must_use]
    pub fn child(&self, key: Key) -> Self {
        Self::under(&self.0, key)
    }

    /// Returns `true` when `self` is a strict prefix of `other`.
    #[must_use]
    pub fn is_strict_prefix_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, key) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("/")?;
            }
            f.write_str(key.as_str())?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<Key>> for FieldPath {
    type Error = Error;

    fn try_from(value: Vec<Key>) -> Result<Self> {
        Self::from_keys(value)
    }
}

impl From<FieldPath> for Vec<Key> {
    fn from(value: FieldPath) -> Self {
        value.0
    }
}

impl From<Key> for FieldPath {
    fn from(value: Key) -> Self {
        Self::single(value)
    }
}
