use derive_more::Display;
use thiserror::Error;

use crate::StoreKey;

/// A store prefix.
///
/// A prefix is either empty (the root) or a `/` terminated string that does not start with `/`, such as `group/array/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{_0}")]
pub struct StorePrefix(String);

/// A list of [`StorePrefix`].
pub type StorePrefixes = Vec<StorePrefix>;

/// An invalid store prefix.
#[derive(Clone, Debug, Error)]
#[error("{0}")]
pub struct StorePrefixError(String);

impl From<String> for StorePrefixError {
    fn from(prefix: String) -> Self {
        Self(prefix)
    }
}

impl StorePrefix {
    /// Create a new store prefix from `prefix`.
    ///
    /// # Errors
    /// Returns [`StorePrefixError`] if `prefix` is not valid according to [`StorePrefix::validate()`].
    pub fn new(prefix: impl Into<String>) -> Result<Self, StorePrefixError> {
        let prefix = prefix.into();
        if Self::validate(&prefix) {
            Ok(Self(prefix))
        } else {
            Err(StorePrefixError(prefix))
        }
    }

    /// Create a new store prefix from `prefix` without validation.
    ///
    /// # Safety
    /// `prefix` is not validated, so this can result in an invalid store prefix.
    #[must_use]
    pub unsafe fn new_unchecked(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        debug_assert!(Self::validate(&prefix));
        Self(prefix)
    }

    /// The root prefix.
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Extracts a string slice of the underlying prefix [`String`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates a prefix.
    #[must_use]
    pub fn validate(prefix: &str) -> bool {
        prefix.is_empty()
            || (prefix.ends_with('/')
                && !prefix.starts_with('/')
                && !prefix[..prefix.len() - 1].split('/').any(str::is_empty))
    }

    /// Returns the key `name` under this prefix.
    ///
    /// # Errors
    /// Returns a [`StoreKeyError`](crate::StoreKeyError) if `name` does not form a valid key.
    pub fn key(&self, name: &str) -> Result<StoreKey, crate::StoreKeyError> {
        StoreKey::new(self.0.clone() + name)
    }
}

impl TryFrom<&str> for StorePrefix {
    type Error = StorePrefixError;

    fn try_from(prefix: &str) -> Result<Self, Self::Error> {
        Self::new(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_prefix() {
        assert!(StorePrefix::new("").is_ok());
        assert!(StorePrefix::new("a/").is_ok());
        assert!(StorePrefix::new("a/b/").is_ok());
        assert!(StorePrefix::new("a").is_err());
        assert!(StorePrefix::new("/a/").is_err());
        assert!(StorePrefix::new("a//").is_err());
        assert_eq!(
            StorePrefix::new("a/").unwrap().key("c/0").unwrap(),
            StoreKey::new("a/c/0").unwrap()
        );
    }
}
