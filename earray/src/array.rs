//! Extensible arrays.
//!
//! An extensible array ([`EArray`]) is a chunked N-dimensional array with exactly one *extendable dimension*
//! which grows as rows are appended.
//! Arrays are created with an [`EArrayBuilder`] or opened from persisted metadata with [`EArray::open`].
//!
//! The chunk shape and in-memory buffer capacity of an array are planned by the [`ChunkGeometryPlanner`].
//! The chunk shape is persisted with the array and governs its layout in the store.
//! The buffer capacity ([`EArray::max_buffer_rows`]) bounds the number of rows processed per step of a bulk copy
//! ([`EArray::copy`]) or buffered iteration ([`EArray::iter_buffers`]).
//!
//! Rows are appended with [`EArray::append`] from a [`RowBuffer`] of raw bytes, or with the typed
//! [`EArray::append_elements`] and [`EArray::append_ndarray`] wrappers.
//! Rows are read with [`EArray::retrieve_rows`] and its typed variants.

mod array_builder;
mod array_copy;
mod array_errors;
pub(crate) mod array_subset;
mod array_sync_readable;
mod array_sync_writable;
mod atom;
mod chunk_geometry;
mod element;
pub mod filters;
mod metadata;
mod physical;
mod row_buffer;
mod row_range;

use std::{num::NonZeroU64, sync::Arc};

pub use self::array_builder::EArrayBuilder;
pub use self::array_copy::CopyOptions;
pub use self::array_errors::{EArrayCreateError, EArrayError};
pub use self::array_sync_readable::RowBufferIterator;
pub use self::atom::{Atom, AtomKind, EnumType, EnumTypeError, IntegerKind};
pub use self::chunk_geometry::{
    BufferSizePolicy, ChunkGeometry, ChunkGeometryPlanner, Shrink, shrink_chunk_shape,
};
pub use self::element::{Element, ElementError, ElementOwned};
pub use self::filters::{Compressor, FilterError, FilterPipeline, Filters};
pub use self::metadata::{EARRAY_VERSION, EArrayMetadata};
pub use self::physical::PhysicalArray;
pub use self::row_buffer::{Endianness, ReadConversion, RowBuffer};
pub use self::row_range::{RowCursor, RowRange, RowRangeError};

use self::array_subset::ArraySubset;
use crate::{
    container::Container,
    node::NodePath,
    storage::ReadableStorageTraits,
};

/// An extensible array.
///
/// The extent of the extendable dimension ([`nrows`](EArray::nrows)) starts at zero for a new array and only
/// changes through [`append`](EArray::append) and [`truncate`](EArray::truncate).
/// Every mutating operation checks that the [`Container`] of the array is writable at the time of the call.
///
/// An array can be shared between threads by wrapping it in a lock, mutating methods take `&mut self`.
#[derive(Debug)]
pub struct EArray<TStorage: ?Sized> {
    /// The container of the array.
    container: Arc<Container<TStorage>>,
    /// The path of the array in the container.
    path: NodePath,
    /// The atom, with a zero extent in the extendable dimension.
    atom: Atom,
    /// The number of rows along the extendable dimension.
    nrows: u64,
    /// The planned chunk geometry.
    geometry: ChunkGeometry,
    /// The expected number of rows used to plan the geometry.
    expected_rows: u64,
    /// The chunked storage engine.
    physical: PhysicalArray<TStorage>,
}

impl<TStorage: ?Sized> EArray<TStorage> {
    /// Get the container.
    #[must_use]
    pub fn container(&self) -> &Arc<Container<TStorage>> {
        &self.container
    }

    /// Get the node path.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Get the atom.
    #[must_use]
    pub const fn atom(&self) -> &Atom {
        &self.atom
    }

    /// Get the current shape. The extent of the extendable dimension equals [`nrows`](EArray::nrows).
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        self.physical.shape()
    }

    /// Get the extendable dimension.
    #[must_use]
    pub const fn extdim(&self) -> usize {
        self.physical.extdim()
    }

    /// Get the number of rows along the extendable dimension.
    #[must_use]
    pub const fn nrows(&self) -> u64 {
        self.nrows
    }

    /// Get the persisted chunk shape.
    ///
    /// For an array opened from a store, this may differ from the chunk shape of [`geometry`](EArray::geometry),
    /// which is replanned from the current number of rows.
    #[must_use]
    pub fn chunk_shape(&self) -> &[NonZeroU64] {
        self.physical.chunk_shape()
    }

    /// Get the maximum number of rows along the extendable dimension processed per buffer.
    #[must_use]
    pub const fn max_buffer_rows(&self) -> NonZeroU64 {
        self.geometry.max_buffer_rows()
    }

    /// Get the planned chunk geometry.
    #[must_use]
    pub const fn geometry(&self) -> &ChunkGeometry {
        &self.geometry
    }

    /// Get the expected number of rows the geometry was planned for.
    #[must_use]
    pub const fn expected_rows(&self) -> u64 {
        self.expected_rows
    }

    /// Get the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.physical.metadata().title
    }

    /// Get the chunk filters.
    #[must_use]
    pub fn filters(&self) -> &Filters {
        &self.physical.metadata().filters
    }

    /// Get the object version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.physical.metadata().version
    }

    /// Get the byte order of stored elements.
    #[must_use]
    pub fn byte_order(&self) -> Endianness {
        self.physical.metadata().byte_order
    }

    /// Get the size in bytes of one row along the extendable dimension.
    #[must_use]
    pub fn row_byte_size(&self) -> u64 {
        self.atom.row_byte_size()
    }

    /// Get the persisted metadata.
    #[must_use]
    pub fn metadata(&self) -> &EArrayMetadata {
        self.physical.metadata()
    }

    /// Get the enumerated type of the array.
    ///
    /// # Errors
    /// Returns [`EArrayError::NotEnumerated`] if the atom is not of an enumerated kind.
    pub fn enum_type(&self) -> Result<&EnumType, EArrayError> {
        match self.atom.kind() {
            AtomKind::Enum(enum_type) => Ok(enum_type),
            _ => Err(EArrayError::NotEnumerated(self.path.clone())),
        }
    }

    /// Normalize a slice of rows against the current number of rows.
    ///
    /// See [`RowRange::normalize`].
    ///
    /// # Errors
    /// Returns a [`RowRangeError`] if the step is not positive or a single row is out of range.
    pub fn row_range(
        &self,
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    ) -> Result<RowRange, RowRangeError> {
        RowRange::normalize(self.nrows, start, stop, step)
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> EArray<TStorage> {
    /// Open an existing extensible array in `container` at `path`.
    ///
    /// The atom is reconstructed from the persisted metadata and the chunk geometry is replanned with the current
    /// number of rows as the expected number of rows.
    ///
    /// # Errors
    /// Returns [`EArrayCreateError`] if there is a storage error or the metadata is missing or invalid.
    pub fn open(
        container: Arc<Container<TStorage>>,
        path: &str,
    ) -> Result<Self, EArrayCreateError> {
        let path = NodePath::new(path)?;
        let physical = PhysicalArray::open(container.storage(), path.clone())?;
        let extdim = physical.extdim();
        let metadata = physical.metadata();
        let atom = Atom::from_metadata(&metadata.atom, &metadata.shape, extdim);
        let nrows = physical.extent();
        let geometry = ChunkGeometryPlanner::default().plan(
            atom.element_byte_size(),
            &metadata.shape,
            extdim,
            nrows,
            metadata.filters.complevel(),
        );
        log::debug!("opened `{path}` with {nrows} rows and atom {atom}");
        Ok(Self {
            container,
            path,
            atom,
            nrows,
            geometry,
            expected_rows: nrows,
            physical,
        })
    }
}

impl<TStorage: ?Sized> std::fmt::Display for EArray<TStorage> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shape = self
            .shape()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        let shape = if shape.len() == 1 {
            format!("({},)", shape[0])
        } else {
            format!("({})", shape.join(", "))
        };
        writeln!(f, "{} (EArray{shape}) '{}'", self.path, self.title())?;
        writeln!(f, "  atom = {}", self.atom)?;
        writeln!(f, "  byteorder = '{}'", self.byte_order().as_str())?;
        writeln!(f, "  nrows = {}", self.nrows)?;
        write!(f, "  extdim = {}", self.extdim())
    }
}

/// Convert from `&[u8]` to `Vec<T>`.
#[must_use]
pub fn convert_from_bytes_slice<T: bytemuck::Pod>(from: &[u8]) -> Vec<T> {
    bytemuck::allocation::pod_collect_to_vec(from)
}

/// Transmute from `Vec<u8>` to `Vec<T>`.
#[must_use]
pub fn transmute_from_bytes_vec<T: bytemuck::Pod>(from: Vec<u8>) -> Vec<T> {
    bytemuck::allocation::try_cast_vec(from)
        .unwrap_or_else(|(_err, from)| convert_from_bytes_slice(&from))
}

/// Convert from `&[T]` to `Vec<u8>`.
#[must_use]
pub fn convert_to_bytes_vec<T: bytemuck::NoUninit>(from: &[T]) -> Vec<u8> {
    bytemuck::allocation::pod_collect_to_vec(from)
}

/// Transmute from `&[T]` to `&[u8]`.
#[must_use]
pub fn transmute_to_bytes<T: bytemuck::NoUninit>(from: &[T]) -> &[u8] {
    bytemuck::must_cast_slice(from)
}

/// Convert a chunk shape to an array shape.
#[must_use]
pub fn chunk_shape_to_array_shape(chunk_shape: &[NonZeroU64]) -> Vec<u64> {
    chunk_shape.iter().map(|i| i.get()).collect()
}

#[cfg(feature = "ndarray")]
/// Convert a vector of elements to an [`ndarray::ArrayD`].
///
/// # Errors
/// Returns an error if the length of `elements` is not equal to the product of the components in `shape`.
pub fn elements_to_ndarray<T>(
    shape: &[u64],
    elements: Vec<T>,
) -> Result<ndarray::ArrayD<T>, EArrayError> {
    let length = elements.len();
    let ndarray_shape = shape
        .iter()
        .map(|v| usize::try_from(*v))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| EArrayError::Other(err.to_string()))?;
    ndarray::ArrayD::<T>::from_shape_vec(ndarray_shape, elements).map_err(|_| {
        EArrayError::Other(format!(
            "{length} elements cannot be arranged in an array with shape {shape:?}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::MemoryStore;

    fn readings() -> EArray<MemoryStore> {
        let container = Arc::new(Container::new(Arc::new(MemoryStore::new())));
        EArrayBuilder::new(Atom::new(AtomKind::Float64, [0, 4]))
            .title("readings")
            .build(container, "/readings")
            .unwrap()
    }

    #[test]
    fn earray_accessors() {
        let array = readings();
        assert_eq!(array.path().as_str(), "/readings");
        assert_eq!(array.shape(), &[0, 4]);
        assert_eq!(array.extdim(), 0);
        assert_eq!(array.nrows(), 0);
        assert_eq!(array.title(), "readings");
        assert_eq!(array.version(), EARRAY_VERSION);
        assert_eq!(array.byte_order(), Endianness::Little);
        assert_eq!(array.row_byte_size(), 32);
        assert_eq!(array.chunk_shape(), array.geometry().chunk_shape());
        assert!(matches!(
            array.enum_type(),
            Err(EArrayError::NotEnumerated(path)) if path.as_str() == "/readings"
        ));
    }

    #[test]
    fn earray_display() {
        let mut array = readings();
        array.append_elements(&[1, 4], &[0.0f64; 4]).unwrap();
        assert_eq!(
            array.to_string(),
            "/readings (EArray(1, 4)) 'readings'\n  atom = Float64Atom(shape=[0, 4])\n  byteorder = 'little'\n  nrows = 1\n  extdim = 0"
        );
    }

    #[test]
    fn earray_row_range() {
        let mut array = readings();
        array.append_elements(&[3, 4], &[0.0f64; 12]).unwrap();
        assert_eq!(
            array.row_range(Some(-1), None, None).unwrap(),
            RowRange::from(2..3)
        );
        assert!(array.row_range(Some(3), None, None).is_err());
    }

    #[test]
    fn bytes_transmute() {
        let values = vec![1u16, 2, 3];
        let bytes = transmute_to_bytes(&values).to_vec();
        assert_eq!(bytes, convert_to_bytes_vec(&values));
        assert_eq!(transmute_from_bytes_vec::<u16>(bytes), values);
    }
}
