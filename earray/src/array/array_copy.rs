use std::sync::Arc;

use super::{EArray, EArrayBuilder, EArrayError, Filters, ReadConversion};
use crate::{
    container::Container,
    storage::{ReadableStorageTraits, ReadableWritableStorageTraits},
};

/// Options for copying an extensible array with [`EArray::copy`].
///
/// `start`, `stop` and `step` select rows along the extendable dimension with slicing conventions, see
/// [`RowRange::normalize`](super::RowRange::normalize).
/// The title and filters of the source are used unless overridden.
#[derive(Clone, Debug, Default)]
pub struct CopyOptions {
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
    title: Option<String>,
    filters: Option<Filters>,
}

impl CopyOptions {
    /// Create new copy options, selecting every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first row.
    #[must_use]
    pub fn with_start(mut self, start: i64) -> Self {
        self.start = Some(start);
        self
    }

    /// Set the end row (exclusive).
    #[must_use]
    pub fn with_stop(mut self, stop: i64) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Set the step between rows.
    #[must_use]
    pub fn with_step(mut self, step: i64) -> Self {
        self.step = Some(step);
        self
    }

    /// Set the title of the copy.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the filters of the copy.
    #[must_use]
    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = Some(filters);
        self
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> EArray<TStorage> {
    /// Copy the rows selected by `options` to a new extensible array in `container` at `path`.
    ///
    /// The copy has the atom of the source and is planned for the number of rows of the source.
    /// Rows are copied in buffers of at most [`max_buffer_rows`](EArray::max_buffer_rows) selected rows, without
    /// byte order conversion.
    ///
    /// Returns the new array and the number of bytes of the source, the element byte size times the number of
    /// elements.
    ///
    /// # Errors
    /// Returns an [`EArrayError`] if the row selection is invalid, the copy cannot be created or a row cannot be read
    /// or appended.
    /// The selection is validated before the copy is created.
    pub fn copy<TStorage2: ?Sized + ReadableWritableStorageTraits>(
        &self,
        container: Arc<Container<TStorage2>>,
        path: &str,
        options: &CopyOptions,
    ) -> Result<(EArray<TStorage2>, u64), EArrayError> {
        let range = self.row_range(options.start, options.stop, options.step)?;

        let mut copy = EArrayBuilder::new(self.atom.clone())
            .title(options.title.as_deref().unwrap_or(self.title()))
            .filters(options.filters.unwrap_or_else(|| *self.filters()))
            .expected_rows(self.nrows)
            .build(container, path)?;

        for window in range.cursor(self.max_buffer_rows()) {
            let buffer = self.retrieve_rows_opt(window, ReadConversion::Raw)?;
            copy.append(&buffer)?;
        }

        let nbytes = self
            .shape()
            .iter()
            .fold(self.atom.element_byte_size(), |size, extent| size.saturating_mul(*extent));
        log::debug!(
            "copied {} of {} rows from `{}` to `{}`",
            copy.nrows(),
            self.nrows,
            self.path,
            copy.path()
        );
        Ok((copy, nbytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{Atom, AtomKind, Compressor};
    use crate::storage::store::MemoryStore;

    #[test]
    #[cfg(feature = "zlib")]
    fn copy_strided_with_overrides() {
        let container = Arc::new(Container::new(Arc::new(MemoryStore::new())));
        let mut source = EArrayBuilder::new(Atom::new(AtomKind::Int16, [0]))
            .title("source")
            .build(container.clone(), "/source")
            .unwrap();
        let elements: Vec<i16> = (0..100).collect();
        source.append_elements(&[100], &elements).unwrap();

        let options = CopyOptions::new()
            .with_start(-10)
            .with_stop(100)
            .with_step(3)
            .with_title("tail")
            .with_filters(Filters::new(1, Compressor::Zlib));
        let (copy, nbytes) = source.copy(container, "/copy", &options).unwrap();
        assert_eq!(nbytes, 200);
        assert_eq!(copy.title(), "tail");
        assert_eq!(copy.filters().complevel(), 1);
        assert_eq!(
            copy.retrieve_elements::<i16>(0..copy.nrows()).unwrap(),
            vec![90, 93, 96, 99]
        );
    }

    #[test]
    fn copy_invalid_selection() {
        let container = Arc::new(Container::new(Arc::new(MemoryStore::new())));
        let source = EArrayBuilder::new(Atom::new(AtomKind::Int16, [0]))
            .build(container.clone(), "/source")
            .unwrap();
        assert!(matches!(
            source.copy(container.clone(), "/copy", &CopyOptions::new().with_step(0)),
            Err(EArrayError::RowRangeError(_))
        ));
        assert_eq!(container.array_paths().unwrap().len(), 1);
    }
}
