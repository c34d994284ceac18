//! The container owning a store of extensible arrays.
//!
//! A [`Container`] wraps a store and arbitrates write permission for every array within it.
//! The access mode can change over the lifetime of a container, so arrays query it before every mutation.

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::{
    node::{EARRAY_METADATA_KEY, NodePath},
    storage::{ListableStorageTraits, StorageError},
};

/// The access mode of a [`Container`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Arrays can be read but not created or modified.
    ReadOnly,
    /// Arrays can be read, created and modified.
    #[default]
    ReadWrite,
}

/// A container error.
#[derive(Clone, Debug, Error)]
pub enum ContainerError {
    /// A mutating operation was attempted on a read only container.
    #[error("the container is read only")]
    ReadOnly,
}

/// A container of extensible arrays.
#[derive(Debug)]
pub struct Container<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    access_mode: RwLock<AccessMode>,
}

impl<TStorage: ?Sized> Container<TStorage> {
    /// Create a new readable and writable container backed by `storage`.
    #[must_use]
    pub fn new(storage: Arc<TStorage>) -> Self {
        Self {
            storage,
            access_mode: RwLock::new(AccessMode::ReadWrite),
        }
    }

    /// Create a new read only container backed by `storage`.
    #[must_use]
    pub fn new_read_only(storage: Arc<TStorage>) -> Self {
        Self {
            storage,
            access_mode: RwLock::new(AccessMode::ReadOnly),
        }
    }

    /// Return the underlying storage.
    #[must_use]
    pub fn storage(&self) -> Arc<TStorage> {
        self.storage.clone()
    }

    /// Return the current access mode.
    #[must_use]
    pub fn access_mode(&self) -> AccessMode {
        *self.access_mode.read()
    }

    /// Set the access mode.
    pub fn set_access_mode(&self, access_mode: AccessMode) {
        *self.access_mode.write() = access_mode;
    }

    /// Check that the container is writable.
    ///
    /// # Errors
    /// Returns [`ContainerError::ReadOnly`] if the container is read only.
    pub fn check_writable(&self) -> Result<(), ContainerError> {
        match self.access_mode() {
            AccessMode::ReadWrite => Ok(()),
            AccessMode::ReadOnly => Err(ContainerError::ReadOnly),
        }
    }
}

impl<TStorage: ?Sized + ListableStorageTraits> Container<TStorage> {
    /// Return the paths of all extensible arrays in the container, sorted.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying error with the store.
    pub fn array_paths(&self) -> Result<Vec<NodePath>, StorageError> {
        let mut paths = self
            .storage
            .list()?
            .into_iter()
            .filter(|key| {
                key.as_str()
                    .rsplit('/')
                    .next()
                    .is_some_and(|name| name == EARRAY_METADATA_KEY)
            })
            .map(|key| {
                NodePath::try_from(&key.parent())
                    .map_err(|err| StorageError::Other(err.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        paths.sort();
        Ok(paths)
    }
}
