use super::{
    EArray, EArrayError, ElementOwned, Endianness, ReadConversion, RowBuffer, RowCursor, RowRange,
};
use crate::storage::ReadableStorageTraits;

impl<TStorage: ?Sized + ReadableStorageTraits> EArray<TStorage> {
    /// Read the rows in `range` along the extendable dimension in the native byte order.
    ///
    /// # Errors
    /// Returns an [`EArrayError`] if the range is out of bounds or there is an underlying store error.
    pub fn retrieve_rows(
        &self,
        range: impl Into<RowRange>,
    ) -> Result<RowBuffer<'static>, EArrayError> {
        self.retrieve_rows_opt(range, ReadConversion::Native)
    }

    /// Explicit options version of [`retrieve_rows`](EArray::retrieve_rows).
    ///
    /// With [`ReadConversion::Raw`] the rows are returned in the stored byte order.
    #[allow(clippy::missing_errors_doc)]
    pub fn retrieve_rows_opt(
        &self,
        range: impl Into<RowRange>,
        conversion: ReadConversion,
    ) -> Result<RowBuffer<'static>, EArrayError> {
        let range = range.into();
        let bytes = self.physical.read_range(&range)?;
        let mut shape = self.shape().to_vec();
        shape[self.extdim()] = range.num_rows();
        let buffer = RowBuffer::new(shape, bytes, self.byte_order());
        Ok(match conversion {
            ReadConversion::Native => buffer.to_byte_order(self.atom.kind(), Endianness::NATIVE),
            ReadConversion::Raw => buffer,
        })
    }

    /// Read the rows in `range` into a vector of elements in C order.
    ///
    /// # Errors
    /// Returns an [`EArrayError`] if the element type is incompatible with the atom kind or
    /// [`retrieve_rows`](EArray::retrieve_rows) fails.
    pub fn retrieve_elements<T: ElementOwned>(
        &self,
        range: impl Into<RowRange>,
    ) -> Result<Vec<T>, EArrayError> {
        T::validate_atom_kind(self.atom.kind())?;
        let buffer = self.retrieve_rows(range)?;
        Ok(T::from_bytes(buffer.into_bytes().into_owned()))
    }

    #[cfg(feature = "ndarray")]
    /// Read the rows in `range` into an [`ndarray::ArrayD`].
    ///
    /// # Errors
    /// Returns an [`EArrayError`] if the element type is incompatible with the atom kind or
    /// [`retrieve_rows`](EArray::retrieve_rows) fails.
    pub fn retrieve_ndarray<T: ElementOwned>(
        &self,
        range: impl Into<RowRange>,
    ) -> Result<ndarray::ArrayD<T>, EArrayError> {
        T::validate_atom_kind(self.atom.kind())?;
        let buffer = self.retrieve_rows(range)?;
        let shape = buffer.shape().to_vec();
        super::elements_to_ndarray(&shape, T::from_bytes(buffer.into_bytes().into_owned()))
    }

    /// Read every row in the native byte order.
    ///
    /// # Errors
    /// Returns an [`EArrayError`] if there is an underlying store error.
    pub fn read_all(&self) -> Result<RowBuffer<'static>, EArrayError> {
        self.retrieve_rows(0..self.nrows)
    }

    /// Return an iterator over the rows in `range`, yielding at most [`max_buffer_rows`](EArray::max_buffer_rows)
    /// rows per buffer.
    ///
    /// # Errors
    /// Returns an [`EArrayError`] if the range is out of bounds.
    pub fn iter_buffers(
        &self,
        range: impl Into<RowRange>,
        conversion: ReadConversion,
    ) -> Result<RowBufferIterator<'_, TStorage>, EArrayError> {
        let range = range.into();
        range.validate(self.nrows)?;
        Ok(RowBufferIterator {
            array: self,
            cursor: range.cursor(self.max_buffer_rows()),
            conversion,
        })
    }
}

/// An iterator over consecutive buffers of rows of an [`EArray`].
///
/// Created by [`EArray::iter_buffers`].
#[derive(Debug)]
pub struct RowBufferIterator<'a, TStorage: ?Sized> {
    array: &'a EArray<TStorage>,
    cursor: RowCursor,
    conversion: ReadConversion,
}

impl<TStorage: ?Sized + ReadableStorageTraits> Iterator for RowBufferIterator<'_, TStorage> {
    type Item = Result<RowBuffer<'static>, EArrayError>;

    fn next(&mut self) -> Option<Self::Item> {
        let window = self.cursor.next()?;
        Some(self.array.retrieve_rows_opt(window, self.conversion))
    }
}
