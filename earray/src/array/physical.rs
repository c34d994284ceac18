//! The chunked storage engine of an extensible array.
//!
//! Chunks are stored full size (zero filled beyond the array extent) under `<path>/c/<i>/<j>/...`, encoded with
//! the filter pipeline of the array.
//! A chunk that is not in the store reads as zeros.

use std::{borrow::Cow, num::NonZeroU64, ops::Range, sync::Arc};

use super::{
    ArraySubset, EArrayCreateError, EArrayError, EArrayMetadata, FilterPipeline, RowRange,
    array_subset::{copy_subset, indices_in, zero_subset},
    chunk_shape_to_array_shape,
};
use crate::{
    node::{NodePath, chunk_key, meta_key},
    storage::{ReadableStorageTraits, ReadableWritableStorageTraits, StorageError, StoreKey},
};

/// A chunked N-dimensional array in a store with one extendable dimension.
#[derive(Debug)]
pub struct PhysicalArray<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    path: NodePath,
    metadata: EArrayMetadata,
    extdim: usize,
    element_size: usize,
    pipeline: FilterPipeline,
}

impl<TStorage: ?Sized> PhysicalArray<TStorage> {
    fn new(
        storage: Arc<TStorage>,
        path: NodePath,
        metadata: EArrayMetadata,
    ) -> Result<Self, EArrayCreateError> {
        let rank = metadata.shape.len();
        let extdim = metadata
            .extdim
            .filter(|extdim| *extdim < rank)
            .ok_or_else(|| EArrayCreateError::MissingExtendableDimension(path.clone()))?;
        if metadata.chunk_shape.len() != rank {
            return Err(EArrayCreateError::InvalidMetadata(
                path,
                format!(
                    "chunk shape {:?} does not match the dimensionality of shape {:?}",
                    metadata.chunk_shape, metadata.shape
                ),
            ));
        }
        let element_size = usize::try_from(metadata.atom.element_byte_size())
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| EArrayCreateError::ZeroSizedAtom(metadata.atom.name()))?;
        let pipeline = metadata.filters.pipeline(element_size)?;
        Ok(Self {
            storage,
            path,
            metadata,
            extdim,
            element_size,
            pipeline,
        })
    }

    /// The persisted metadata, reflecting the current shape.
    #[must_use]
    pub fn metadata(&self) -> &EArrayMetadata {
        &self.metadata
    }

    /// The current shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.metadata.shape
    }

    /// The extendable dimension.
    #[must_use]
    pub const fn extdim(&self) -> usize {
        self.extdim
    }

    /// The chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &[NonZeroU64] {
        &self.metadata.chunk_shape
    }

    /// The current extent of the extendable dimension.
    #[must_use]
    pub fn extent(&self) -> u64 {
        self.metadata.shape[self.extdim]
    }

    fn chunk_num_bytes(&self) -> usize {
        let elements: u64 = self.metadata.chunk_shape.iter().map(|v| v.get()).product();
        usize::try_from(elements).unwrap_or(usize::MAX) * self.element_size
    }

    fn chunk_key(&self, chunk_indices: &[u64]) -> Result<StoreKey, StorageError> {
        Ok(chunk_key(&self.path, chunk_indices)?)
    }

    fn chunk_subset(&self, chunk_indices: &[u64]) -> ArraySubset {
        let ranges: Vec<Range<u64>> = std::iter::zip(chunk_indices, &self.metadata.chunk_shape)
            .map(|(index, size)| index * size.get()..(index + 1) * size.get())
            .collect();
        ArraySubset::new_with_ranges(&ranges)
    }

    /// The chunk grid indices of chunks overlapping rows `rows` of the extendable dimension.
    fn chunks_in_rows(&self, rows: Range<u64>) -> Vec<Vec<u64>> {
        let ranges: Vec<Range<u64>> = std::iter::zip(self.shape(), self.chunk_shape())
            .enumerate()
            .map(|(axis, (extent, size))| {
                if axis == self.extdim {
                    if rows.is_empty() {
                        0..0
                    } else {
                        rows.start / size.get()..(rows.end - 1) / size.get() + 1
                    }
                } else {
                    0..extent.div_ceil(size.get())
                }
            })
            .collect();
        indices_in(&ranges)
    }

    fn with_extent(&self, extent: u64) -> Vec<u64> {
        let mut shape = self.shape().to_vec();
        shape[self.extdim] = extent;
        shape
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> PhysicalArray<TStorage> {
    /// Open the array at `path` from its persisted metadata.
    ///
    /// # Errors
    /// Returns an [`EArrayCreateError`] if the metadata is missing or invalid, including a missing or out of
    /// bounds extendable dimension.
    pub fn open(storage: Arc<TStorage>, path: NodePath) -> Result<Self, EArrayCreateError> {
        let key = meta_key(&path);
        let Some(bytes) = storage.get(&key)? else {
            return Err(EArrayCreateError::MissingMetadata(path));
        };
        let metadata: EArrayMetadata = serde_json::from_slice(&bytes)
            .map_err(|err| EArrayCreateError::InvalidMetadata(path.clone(), err.to_string()))?;
        Self::new(storage, path, metadata)
    }

    /// Retrieve and decode the chunk at `chunk_indices`.
    ///
    /// A missing chunk is returned as zeros.
    ///
    /// # Errors
    /// Returns an [`EArrayError`] if the chunk cannot be retrieved or decoded.
    pub fn retrieve_chunk(&self, chunk_indices: &[u64]) -> Result<Vec<u8>, EArrayError> {
        let num_bytes = self.chunk_num_bytes();
        let Some(encoded) = self.storage.get(&self.chunk_key(chunk_indices)?)? else {
            return Ok(vec![0; num_bytes]);
        };
        let decoded = self.pipeline.decode(Cow::Borrowed(&encoded[..]))?.into_owned();
        if decoded.len() == num_bytes {
            Ok(decoded)
        } else {
            Err(EArrayError::UnexpectedChunkDecodedSize(
                decoded.len(),
                num_bytes,
            ))
        }
    }

    /// Read the rows in `range` along the extendable dimension.
    ///
    /// The returned bytes are in the stored byte order with the array shape and `range.num_rows()` rows.
    /// Only chunks holding selected rows are retrieved.
    ///
    /// # Errors
    /// Returns an [`EArrayError`] if the range is out of bounds or a chunk cannot be retrieved.
    pub fn read_range(&self, range: &RowRange) -> Result<Vec<u8>, EArrayError> {
        range.validate(self.extent())?;
        let out_shape = self.with_extent(range.num_rows());
        let out_elements: u64 = out_shape.iter().product();
        let mut out = vec![0; usize::try_from(out_elements).unwrap_or(usize::MAX) * self.element_size];
        if range.is_empty() {
            return Ok(out);
        }

        let step = range.step().get();
        let chunk_shape = chunk_shape_to_array_shape(self.chunk_shape());
        for chunk_indices in self.chunks_in_rows(range.start()..range.stop()) {
            let chunk_subset = self.chunk_subset(&chunk_indices);
            let chunk_rows =
                chunk_subset.start()[self.extdim]..chunk_subset.end_exc()[self.extdim];
            // the first selected row in the chunk
            let first = if chunk_rows.start <= range.start() {
                range.start()
            } else {
                range.start() + (chunk_rows.start - range.start()).div_ceil(step) * step
            };
            let last = chunk_rows.end.min(range.stop());
            if first >= last {
                continue;
            }

            let chunk = self.retrieve_chunk(&chunk_indices)?;
            let runs: Vec<Range<u64>> = if step == 1 {
                vec![first..last]
            } else {
                (first..last)
                    .step_by(usize::try_from(step).unwrap_or(usize::MAX))
                    .map(|row| row..row + 1)
                    .collect()
            };
            for rows in runs {
                let mut ranges: Vec<Range<u64>> =
                    std::iter::zip(chunk_subset.start(), chunk_subset.end_exc())
                        .zip(self.shape())
                        .map(|((start, end), extent)| *start..end.min(*extent))
                        .collect();
                ranges[self.extdim] = rows.clone();
                let src_subset =
                    ArraySubset::new_with_ranges(&ranges).relative_to(chunk_subset.start());
                let out_index = (rows.start - range.start()) / step;
                ranges[self.extdim] = out_index..out_index + (rows.end - rows.start);
                let dst_subset = ArraySubset::new_with_ranges(&ranges);
                copy_subset(
                    &chunk,
                    &chunk_shape,
                    &src_subset,
                    &mut out,
                    &out_shape,
                    &dst_subset,
                    self.element_size,
                );
            }
        }
        Ok(out)
    }
}

impl<TStorage: ?Sized + ReadableWritableStorageTraits> PhysicalArray<TStorage> {
    /// Create the array at `path` and store its metadata.
    ///
    /// # Errors
    /// Returns an [`EArrayCreateError`] if the metadata is invalid or cannot be stored.
    pub fn create(
        storage: Arc<TStorage>,
        path: NodePath,
        metadata: EArrayMetadata,
    ) -> Result<Self, EArrayCreateError> {
        let array = Self::new(storage, path, metadata)?;
        array.store_metadata()?;
        Ok(array)
    }

    /// Store the metadata.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying store error.
    pub fn store_metadata(&self) -> Result<(), StorageError> {
        let key = meta_key(&self.path);
        let json = serde_json::to_vec_pretty(&self.metadata)
            .map_err(|err| StorageError::InvalidMetadata(key.clone(), err.to_string()))?;
        self.storage.set(&key, json.into())
    }

    /// Encode and store `chunk_bytes` at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`EArrayError`] if the chunk cannot be encoded or stored.
    pub fn store_chunk(&self, chunk_indices: &[u64], chunk_bytes: &[u8]) -> Result<(), EArrayError> {
        let encoded = self.pipeline.encode(Cow::Borrowed(chunk_bytes))?;
        self.storage
            .set(&self.chunk_key(chunk_indices)?, encoded.into_owned().into())?;
        Ok(())
    }

    /// Append `rows` rows in `bytes` (stored byte order, C order) along the extendable dimension.
    ///
    /// The metadata is updated once every chunk is stored.
    /// On failure the extent and the persisted metadata are unchanged, but chunks already stored beyond the old
    /// extent are left behind. They are never read, since reads are bounded by the extent and a later extend
    /// overwrites every row it adds.
    ///
    /// # Errors
    /// Returns an [`EArrayError`] if the length of `bytes` does not match `rows`, the new extent overflows, or a store
    /// operation fails.
    pub fn extend(&mut self, bytes: &[u8], rows: u64) -> Result<(), EArrayError> {
        let old_extent = self.extent();
        let buffer_shape = self.with_extent(rows);
        let new_extent = old_extent
            .checked_add(rows)
            .ok_or_else(|| EArrayError::ShapeOverflow(buffer_shape.clone()))?;
        let expected_len = buffer_shape
            .iter()
            .try_fold(self.element_size as u64, |size, extent| size.checked_mul(*extent))
            .ok_or_else(|| EArrayError::ShapeOverflow(buffer_shape.clone()))?;
        if bytes.len() as u64 != expected_len {
            return Err(EArrayError::InvalidBytesInputSize(bytes.len(), expected_len));
        }
        if rows == 0 {
            return Ok(());
        }

        let mut ranges: Vec<Range<u64>> = self.shape().iter().map(|extent| 0..*extent).collect();
        ranges[self.extdim] = old_extent..new_extent;
        let region = ArraySubset::new_with_ranges(&ranges);
        let chunk_shape = chunk_shape_to_array_shape(self.chunk_shape());
        for chunk_indices in self.chunks_in_rows(old_extent..new_extent) {
            let chunk_subset = self.chunk_subset(&chunk_indices);
            let Some(overlap) = chunk_subset.overlap(&region) else {
                continue;
            };
            let mut chunk = if chunk_subset.start()[self.extdim] < old_extent {
                self.retrieve_chunk(&chunk_indices)?
            } else {
                vec![0; self.chunk_num_bytes()]
            };
            copy_subset(
                bytes,
                &buffer_shape,
                &overlap.relative_to(region.start()),
                &mut chunk,
                &chunk_shape,
                &overlap.relative_to(chunk_subset.start()),
                self.element_size,
            );
            self.store_chunk(&chunk_indices, &chunk)?;
        }

        self.metadata.shape[self.extdim] = new_extent;
        if let Err(err) = self.store_metadata() {
            self.metadata.shape[self.extdim] = old_extent;
            return Err(err.into());
        }
        Ok(())
    }

    /// Truncate the extendable dimension to `new_extent` rows.
    ///
    /// Chunks entirely beyond the new extent are erased and the tail of the boundary chunk is zeroed.
    /// Does nothing if `new_extent` is not less than the current extent.
    ///
    /// # Errors
    /// Returns an [`EArrayError`] if a store operation fails.
    pub fn truncate(&mut self, new_extent: u64) -> Result<(), EArrayError> {
        let old_extent = self.extent();
        if new_extent >= old_extent {
            return Ok(());
        }
        let chunk_rows = self.chunk_shape()[self.extdim].get();
        let chunk_shape = chunk_shape_to_array_shape(self.chunk_shape());

        let erase_from = new_extent.div_ceil(chunk_rows) * chunk_rows;
        if erase_from < old_extent {
            let keys = self
                .chunks_in_rows(erase_from..old_extent)
                .iter()
                .map(|chunk_indices| self.chunk_key(chunk_indices))
                .collect::<Result<Vec<_>, _>>()?;
            self.storage.erase_values(&keys)?;
        }

        if !new_extent.is_multiple_of(chunk_rows) {
            for chunk_indices in self.chunks_in_rows(new_extent..new_extent + 1) {
                let chunk_subset = self.chunk_subset(&chunk_indices);
                let mut chunk = self.retrieve_chunk(&chunk_indices)?;
                let mut ranges: Vec<Range<u64>> = chunk_shape.iter().map(|size| 0..*size).collect();
                ranges[self.extdim] = new_extent - chunk_subset.start()[self.extdim]..chunk_rows;
                zero_subset(
                    &mut chunk,
                    &chunk_shape,
                    &ArraySubset::new_with_ranges(&ranges),
                    self.element_size,
                );
                self.store_chunk(&chunk_indices, &chunk)?;
            }
        }

        self.metadata.shape[self.extdim] = new_extent;
        self.store_metadata()?;
        Ok(())
    }
}
