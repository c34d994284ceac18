use std::borrow::Cow;

use super::{EArray, EArrayError, Element, RowBuffer, row_buffer::swap_bytes};
use crate::storage::ReadableWritableStorageTraits;

impl<TStorage: ?Sized + ReadableWritableStorageTraits> EArray<TStorage> {
    /// Append the rows in `buffer` along the extendable dimension.
    ///
    /// The shape of `buffer` must match the array shape in every dimension other than the extendable dimension.
    /// Its bytes are converted to the stored byte order and validated against the atom kind, the caller's buffer
    /// is never modified.
    /// Appending zero rows does nothing.
    ///
    /// # Errors
    /// Returns an [`EArrayError`] if
    ///  - the container is read only,
    ///  - the buffer rank or shape is incompatible with the array,
    ///  - the buffer length does not match its shape,
    ///  - an element is not valid for the atom kind, or
    ///  - there is an underlying store error.
    ///
    /// The number of rows is unchanged on error.
    pub fn append(&mut self, buffer: &RowBuffer) -> Result<(), EArrayError> {
        self.container.check_writable()?;

        let shape = self.shape();
        let extdim = self.extdim();
        if buffer.shape().len() != shape.len() {
            return Err(EArrayError::RankMismatch {
                path: self.path.clone(),
                buffer_rank: buffer.shape().len(),
                array_rank: shape.len(),
            });
        }
        if let Some((axis, (expected, actual))) = std::iter::zip(shape, buffer.shape())
            .enumerate()
            .find(|(axis, (expected, actual))| *axis != extdim && expected != actual)
        {
            return Err(EArrayError::DimensionMismatch {
                path: self.path.clone(),
                axis,
                expected: *expected,
                actual: *actual,
            });
        }
        let expected_len = buffer
            .num_elements()
            .and_then(|count| count.checked_mul(self.atom.element_byte_size()))
            .ok_or_else(|| EArrayError::ShapeOverflow(buffer.shape().to_vec()))?;
        if buffer.bytes().len() as u64 != expected_len {
            return Err(EArrayError::InvalidBytesInputSize(
                buffer.bytes().len(),
                expected_len,
            ));
        }

        let rows = buffer.shape()[extdim];
        if rows == 0 {
            return Ok(());
        }

        let kind = self.atom.kind();
        let byte_order = self.byte_order();
        let mut bytes = Cow::Borrowed(buffer.bytes());
        swap_bytes(&mut bytes, kind, buffer.byte_order(), byte_order);
        kind.normalize(&mut bytes, byte_order)?;

        self.physical.extend(&bytes, rows)?;
        self.nrows += rows;
        Ok(())
    }

    /// Append `elements` with `shape` along the extendable dimension.
    ///
    /// # Errors
    /// Returns an [`EArrayError`] if the element type is incompatible with the atom kind or [`append`](EArray::append)
    /// fails.
    pub fn append_elements<T: Element>(
        &mut self,
        shape: &[u64],
        elements: &[T],
    ) -> Result<(), EArrayError> {
        T::validate_atom_kind(self.atom.kind())?;
        let buffer = RowBuffer::new_native(shape, T::to_bytes(elements));
        self.append(&buffer)
    }

    #[cfg(feature = "ndarray")]
    /// Append an [`ndarray::ArrayBase`] along the extendable dimension.
    ///
    /// # Errors
    /// Returns an [`EArrayError`] if the element type is incompatible with the atom kind or [`append`](EArray::append)
    /// fails.
    pub fn append_ndarray<T: Element + Clone, S: ndarray::Data<Elem = T>, D: ndarray::Dimension>(
        &mut self,
        array: &ndarray::ArrayBase<S, D>,
    ) -> Result<(), EArrayError> {
        let shape: Vec<u64> = array.shape().iter().map(|v| *v as u64).collect();
        let array = array.as_standard_layout();
        let elements = array
            .as_slice()
            .ok_or_else(|| EArrayError::Other("the array is not in standard layout".to_string()))?;
        self.append_elements(&shape, elements)
    }

    /// Truncate the extendable dimension to `size` rows.
    ///
    /// Rows at or beyond `size` are discarded.
    /// Does nothing if `size` is not less than the number of rows.
    ///
    /// # Errors
    /// Returns [`EArrayError::InvalidTruncateSize`] if `size` is zero, or another [`EArrayError`] if the container is
    /// read only or there is an underlying store error.
    pub fn truncate(&mut self, size: u64) -> Result<(), EArrayError> {
        if size == 0 {
            return Err(EArrayError::InvalidTruncateSize);
        }
        self.container.check_writable()?;
        if size >= self.nrows {
            return Ok(());
        }
        self.physical.truncate(size)?;
        log::debug!("truncated `{}` from {} to {size} rows", self.path, self.nrows);
        self.nrows = size;
        Ok(())
    }
}
