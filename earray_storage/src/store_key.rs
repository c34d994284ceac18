use derive_more::Display;
use thiserror::Error;

use crate::StorePrefix;

/// A store key.
///
/// A key is a `/` separated string that does not start or end with `/`, such as `group/array/c/0/1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{_0}")]
pub struct StoreKey(String);

/// A list of [`StoreKey`].
pub type StoreKeys = Vec<StoreKey>;

/// An invalid store key.
#[derive(Clone, Debug, Error)]
#[error("{0}")]
pub struct StoreKeyError(String);

impl From<String> for StoreKeyError {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for StoreKeyError {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl StoreKey {
    /// Create a new store key from `key`.
    ///
    /// # Errors
    /// Returns [`StoreKeyError`] if `key` is not valid according to [`StoreKey::validate()`].
    pub fn new(key: impl Into<String>) -> Result<Self, StoreKeyError> {
        let key = key.into();
        if Self::validate(&key) {
            Ok(Self(key))
        } else {
            Err(StoreKeyError(key))
        }
    }

    /// Create a new store key from `key` without validation.
    ///
    /// # Safety
    /// `key` is not validated, so this can result in an invalid store key.
    #[must_use]
    pub unsafe fn new_unchecked(key: impl Into<String>) -> Self {
        let key = key.into();
        debug_assert!(Self::validate(&key));
        Self(key)
    }

    /// Extracts a string slice of the underlying key [`String`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates a key.
    ///
    /// A key must be non-empty, must not start or end with `/`, and must not contain empty path segments.
    #[must_use]
    pub fn validate(key: &str) -> bool {
        !key.is_empty()
            && !key.starts_with('/')
            && !key.ends_with('/')
            && !key.split('/').any(str::is_empty)
    }

    /// Returns true if the key has prefix `prefix`.
    #[must_use]
    pub fn has_prefix(&self, prefix: &StorePrefix) -> bool {
        self.0.starts_with(prefix.as_str())
    }

    /// Returns the parent prefix of the key.
    #[must_use]
    pub fn parent(&self) -> StorePrefix {
        let parent = self
            .0
            .rsplit_once('/')
            .map_or(String::new(), |(parent, _)| parent.to_string() + "/");
        unsafe { StorePrefix::new_unchecked(parent) }
    }
}

impl TryFrom<&str> for StoreKey {
    type Error = StoreKeyError;

    fn try_from(key: &str) -> Result<Self, Self::Error> {
        Self::new(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_key() {
        assert!(StoreKey::new("a").is_ok());
        assert!(StoreKey::new("a/b/c/0/1").is_ok());
        assert!(StoreKey::new("").is_err());
        assert!(StoreKey::new("/a").is_err());
        assert!(StoreKey::new("a/").is_err());
        assert!(StoreKey::new("a//b").is_err());
        assert_eq!(StoreKey::new("a/b").unwrap().to_string(), "a/b");
    }

    #[test]
    fn store_key_parent() {
        let key = StoreKey::new("a/b/earray.json").unwrap();
        assert_eq!(key.parent(), StorePrefix::new("a/b/").unwrap());
        assert!(key.has_prefix(&StorePrefix::new("a/").unwrap()));
        assert!(!key.has_prefix(&StorePrefix::new("b/").unwrap()));

        let key = StoreKey::new("earray.json").unwrap();
        assert_eq!(key.parent(), StorePrefix::root());
    }
}
