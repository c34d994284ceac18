use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use super::{AtomKind, Endianness, Filters};

/// The object version of extensible arrays written by this crate.
pub const EARRAY_VERSION: &str = "1.3";

/// The persisted metadata of an extensible array.
///
/// Stored as pretty printed JSON under the `earray.json` key of the array.
///
/// ### Example
/// ```json
/// {
///   "version": "1.3",
///   "title": "readings",
///   "atom": { "type": "float64" },
///   "shape": [10, 4],
///   "extdim": 0,
///   "chunk_shape": [62, 4],
///   "filters": { "complevel": 0, "complib": "zlib", "shuffle": true, "fletcher32": false },
///   "byte_order": "little"
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EArrayMetadata {
    /// The object version.
    pub version: String,
    /// The title.
    #[serde(default)]
    pub title: String,
    /// The element kind.
    pub atom: AtomKind,
    /// The current shape.
    pub shape: Vec<u64>,
    /// The extendable dimension.
    ///
    /// A missing extendable dimension is invalid, but is represented so it can be reported.
    #[serde(default)]
    pub extdim: Option<usize>,
    /// The chunk shape.
    pub chunk_shape: Vec<NonZeroU64>,
    /// The chunk filters.
    #[serde(default)]
    pub filters: Filters,
    /// The byte order of stored elements.
    pub byte_order: Endianness,
}
