//! Array node paths and the store keys derived from them.
//!
//! An array at node path `/a/b` stores its metadata at `a/b/earray.json` and its chunks at `a/b/c/<i>/<j>/...`.

use derive_more::Display;
use thiserror::Error;

use crate::storage::{StoreKey, StoreKeyError, StorePrefix};

/// The name of the metadata key of an extensible array.
pub const EARRAY_METADATA_KEY: &str = "earray.json";

/// A node path.
///
/// A node path starts with `/`, has no trailing `/` (other than the root path) and no empty components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{_0}")]
pub struct NodePath(String);

/// An invalid node path.
#[derive(Clone, Debug, Error)]
#[error("invalid node path {0}")]
pub struct NodePathError(String);

impl NodePath {
    /// Create a new node path from `path`.
    ///
    /// # Errors
    /// Returns [`NodePathError`] if `path` is not valid.
    pub fn new(path: &str) -> Result<Self, NodePathError> {
        if Self::validate(path) {
            Ok(Self(path.to_string()))
        } else {
            Err(NodePathError(path.to_string()))
        }
    }

    /// The root node.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Extracts a string slice of the underlying path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates a path.
    #[must_use]
    pub fn validate(path: &str) -> bool {
        path == "/"
            || (path.starts_with('/')
                && !path.ends_with('/')
                && path[1..].split('/').all(|component| !component.is_empty()))
    }
}

impl TryFrom<&StorePrefix> for NodePath {
    type Error = NodePathError;

    fn try_from(prefix: &StorePrefix) -> Result<Self, Self::Error> {
        let path = format!("/{}", prefix.as_str().strip_suffix('/').unwrap_or_default());
        Self::new(&path)
    }
}

/// Convert a node path to a [`StorePrefix`].
#[must_use]
pub fn node_prefix(path: &NodePath) -> StorePrefix {
    let path = path.as_str().strip_prefix('/').unwrap_or(path.as_str());
    if path.is_empty() {
        StorePrefix::root()
    } else {
        // SAFETY: a non-root node path has no leading `/` or empty components once stripped
        unsafe { StorePrefix::new_unchecked(format!("{path}/")) }
    }
}

/// Create the metadata key of an extensible array at `path`.
#[must_use]
pub fn meta_key(path: &NodePath) -> StoreKey {
    let key = format!("{}{EARRAY_METADATA_KEY}", node_prefix(path).as_str());
    // SAFETY: the key is a valid prefix followed by a non-empty name
    unsafe { StoreKey::new_unchecked(key) }
}

/// Create the key of the chunk at `chunk_indices` of the array at `path`.
///
/// # Errors
/// Returns [`StoreKeyError`] if the resulting key is not valid.
pub fn chunk_key(path: &NodePath, chunk_indices: &[u64]) -> Result<StoreKey, StoreKeyError> {
    let indices = chunk_indices
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/");
    node_prefix(path).key(&format!("c/{indices}"))
}
