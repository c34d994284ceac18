//! `earray` is a Rust library for **extensible, chunked, multidimensional arrays**.
//!
//! An extensible array ([`EArray`](crate::array::EArray)) holds homogeneous elements described by an
//! [`Atom`](crate::array::Atom).
//! Exactly one dimension of the atom shape is `0`: this is the *extendable dimension*, which grows as rows are
//! appended without ever rewriting existing data.
//!
//! ## Chunk Geometry
//! Arrays are persisted as fixed-shape chunks in a key/value store.
//! The [`ChunkGeometryPlanner`](crate::array::ChunkGeometryPlanner) chooses the chunk shape and the number of rows
//! processed per in-memory buffer from the element size, the array shape and the expected number of rows.
//! The buffer capacity bounds the memory used by every append and bulk copy step, regardless of how many rows the
//! array ultimately holds.
//!
//! ## Getting Started
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use earray::array::{Atom, AtomKind, EArrayBuilder};
//! use earray::container::Container;
//! use earray::storage::store::MemoryStore;
//!
//! let container = Arc::new(Container::new(Arc::new(MemoryStore::new())));
//! let mut array = EArrayBuilder::new(Atom::new(AtomKind::Float64, [0, 4]))
//!     .expected_rows(10_000)
//!     .title("readings")
//!     .build(container.clone(), "/readings")?;
//!
//! array.append_elements(&[2, 4], &[0.0f64, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0])?;
//! assert_eq!(array.nrows(), 2);
//! assert_eq!(array.shape(), &[2, 4]);
//!
//! let row: Vec<f64> = array.retrieve_elements(1..2)?;
//! assert_eq!(row, [4.0, 5.0, 6.0, 7.0]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Features
//! #### Default
//!  - `filesystem`: Re-export `earray_filesystem` as `earray::filesystem`.
//!  - `ndarray`: [`ndarray`] utility functions for [`EArray`](crate::array::EArray).
//!  - `zlib`: the zlib compressor.
//!  - `bz2`: the bzip2 compressor.
//!
//! ## Logging
//! `earray` logs through the [`log`] facade. No logger is installed by the library.
//!
//! ## Licence
//! `earray` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.

pub mod array;
pub mod config;
pub mod container;
pub mod node;

#[cfg(feature = "filesystem")]
pub use earray_filesystem as filesystem;
pub use earray_storage as storage;

#[cfg(feature = "ndarray")]
/// Re-export [`ndarray`].
pub use ndarray;
