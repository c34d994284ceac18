use std::sync::Arc;

use super::{
    Atom, ChunkGeometryPlanner, EARRAY_VERSION, EArray, EArrayCreateError, EArrayMetadata,
    Endianness, Filters, PhysicalArray,
};
use crate::{
    config::global_config,
    container::Container,
    node::{NodePath, meta_key},
    storage::ReadableWritableStorageTraits,
};

/// An [`EArray`] builder.
///
/// [`EArrayBuilder`] is initialised from an [`Atom`] with exactly one zero entry in its base shape, marking the
/// extendable dimension.
///  - The title is empty.
///  - The filters are the [`Filters::default`] (uncompressed).
///  - The expected number of rows is taken from the [global configuration](crate::config::Config::expected_rows).
///
/// [`build`](EArrayBuilder::build) plans the chunk geometry and stores the array metadata.
///
/// ### Example
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # use std::sync::Arc;
/// use earray::array::{Atom, AtomKind, Compressor, EArrayBuilder, Filters};
/// use earray::container::Container;
/// # let container = Arc::new(Container::new(Arc::new(earray::storage::store::MemoryStore::new())));
/// let array = EArrayBuilder::new(Atom::new(AtomKind::Int32, [3, 0]))
///     .expected_rows(1_000_000)
///     .filters(Filters::new(5, Compressor::Zlib).with_fletcher32(true))
///     .build(container, "/group/counts")?;
/// assert_eq!(array.extdim(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct EArrayBuilder {
    atom: Atom,
    title: String,
    filters: Filters,
    expected_rows: Option<u64>,
}

impl EArrayBuilder {
    /// Create a new extensible array builder for an array with `atom`.
    #[must_use]
    pub fn new(atom: Atom) -> Self {
        Self {
            atom,
            title: String::new(),
            filters: Filters::default(),
            expected_rows: None,
        }
    }

    /// Set the title.
    pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    /// Set the chunk filters.
    pub fn filters(&mut self, filters: Filters) -> &mut Self {
        self.filters = filters;
        self
    }

    /// Set the expected number of rows along the extendable dimension.
    ///
    /// This only seeds the chunk geometry, the array can hold any number of rows.
    pub fn expected_rows(&mut self, expected_rows: u64) -> &mut Self {
        self.expected_rows = Some(expected_rows);
        self
    }

    /// Validate the atom and return the extendable dimension.
    fn extdim(&self) -> Result<usize, EArrayCreateError> {
        let atom = &self.atom;
        if atom.base_shape().is_empty() {
            return Err(EArrayCreateError::InvalidAtomShape(atom.kind().name()));
        }
        if atom.element_byte_size() == 0 {
            return Err(EArrayCreateError::ZeroSizedAtom(atom.kind().name()));
        }
        match atom.zero_dimensions().as_slice() {
            [extdim] => Ok(*extdim),
            [] => Err(EArrayCreateError::NoExtendableDimension(
                atom.base_shape().to_vec(),
            )),
            _ => Err(EArrayCreateError::MultipleExtendableDimensions(
                atom.base_shape().to_vec(),
            )),
        }
    }

    /// Build into an [`EArray`] in `container` at `path`, storing its metadata.
    ///
    /// # Errors
    /// Returns [`EArrayCreateError`] if
    ///  - the container is read only,
    ///  - the path is invalid or a node already exists at it,
    ///  - the atom is invalid,
    ///  - the filters are unsupported, or
    ///  - there is an underlying store error.
    pub fn build<TStorage: ?Sized + ReadableWritableStorageTraits>(
        &self,
        container: Arc<Container<TStorage>>,
        path: &str,
    ) -> Result<EArray<TStorage>, EArrayCreateError> {
        container.check_writable()?;
        let path = NodePath::new(path)?;
        let extdim = self.extdim()?;

        let storage = container.storage();
        if storage.get(&meta_key(&path))?.is_some() {
            return Err(EArrayCreateError::NodeExists(path));
        }

        let (planner, default_expected_rows) = {
            let config = global_config();
            (ChunkGeometryPlanner::from_config(&config), config.expected_rows())
        };
        let expected_rows = self.expected_rows.unwrap_or(default_expected_rows);
        let shape = self.atom.base_shape().to_vec();
        let geometry = planner.plan(
            self.atom.element_byte_size(),
            &shape,
            extdim,
            expected_rows,
            self.filters.complevel(),
        );

        let metadata = EArrayMetadata {
            version: EARRAY_VERSION.to_string(),
            title: self.title.clone(),
            atom: self.atom.kind().clone(),
            shape,
            extdim: Some(extdim),
            chunk_shape: geometry.chunk_shape().to_vec(),
            filters: self.filters,
            byte_order: Endianness::Little,
        };
        let physical = PhysicalArray::create(storage, path.clone(), metadata)?;
        log::debug!(
            "created `{path}` with atom {} and chunk shape {:?}",
            self.atom,
            physical.chunk_shape()
        );

        Ok(EArray {
            container,
            path,
            atom: self.atom.clone(),
            nrows: 0,
            geometry,
            expected_rows,
            physical,
        })
    }
}
