//! Chunk geometry planning.
//!
//! The chunk geometry of an extensible array is its chunk shape and the number of rows along the extendable
//! dimension processed per in-memory buffer.
//! Both are derived from a byte budget for one buffer, which in turn depends on the expected size of the array.

use std::num::NonZeroU64;

use crate::config::{Config, global_config};

/// Maps the expected size of an array to the byte budget of one in-memory buffer.
///
/// The budget grows with the expected size in steps:
///
/// | expected size   | size class |
/// |-----------------|------------|
/// | ≤ 100 KiB       | 5          |
/// | ≤ 1000 KiB      | 10         |
/// | ≤ 20000 KiB     | 20         |
/// | ≤ 200000 KiB    | 40         |
/// | ≤ 2000000 KiB   | 50         |
/// | otherwise       | 60         |
///
/// The budget is the size class times a multiplier in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferSizePolicy {
    multiplier: u64,
}

impl Default for BufferSizePolicy {
    fn default() -> Self {
        Self { multiplier: 2000 }
    }
}

impl BufferSizePolicy {
    /// Create a new buffer size policy with a size class `multiplier` in bytes.
    #[must_use]
    pub const fn new(multiplier: u64) -> Self {
        Self { multiplier }
    }

    /// The size class multiplier in bytes.
    #[must_use]
    pub const fn multiplier(&self) -> u64 {
        self.multiplier
    }

    /// The buffer byte budget for an array with an expected size of `expected_bytes`.
    #[must_use]
    pub fn buffer_size(&self, expected_bytes: u64) -> u64 {
        let expected_kib = expected_bytes / 1024;
        let size_class: u64 = match expected_kib {
            0..=100 => 5,
            101..=1_000 => 10,
            1_001..=20_000 => 20,
            20_001..=200_000 => 40,
            200_001..=2_000_000 => 50,
            _ => 60,
        };
        size_class.saturating_mul(self.multiplier)
    }
}

/// The chunk geometry of an extensible array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkGeometry {
    chunk_shape: Vec<NonZeroU64>,
    max_buffer_rows: NonZeroU64,
}

impl ChunkGeometry {
    /// The chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &[NonZeroU64] {
        &self.chunk_shape
    }

    /// The maximum number of rows along the extendable dimension held by one in-memory buffer.
    #[must_use]
    pub const fn max_buffer_rows(&self) -> NonZeroU64 {
        self.max_buffer_rows
    }
}

/// The outcome of shrinking a chunk shape to fit a buffer budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shrink {
    /// The rows along `axis` were clamped to `rows`, so that one chunk fits the budget.
    Fitted {
        /// The axis the budget was reached at.
        axis: usize,
        /// The number of rows of `axis` fitting the budget.
        rows: u64,
    },
    /// Not even one element fits the budget, every axis has size `1`.
    Exhausted,
}

/// Shrink `chunk_shape` outermost axis first until the rows of an axis fit `budget`.
///
/// The row size of axis `j` is `element_byte_size` times the product of `chunk_shape[j+1..]`.
/// Axes that cannot hold a single row within the budget are reduced to `1`.
/// If every axis is exhausted, the shape is all ones and the chunk exceeds the budget.
#[must_use]
pub fn shrink_chunk_shape(
    element_byte_size: u64,
    budget: u64,
    chunk_shape: &[u64],
) -> (Vec<u64>, Shrink) {
    let init = (Vec::with_capacity(chunk_shape.len()), Shrink::Exhausted);
    chunk_shape
        .iter()
        .enumerate()
        .fold(init, |(mut shape, outcome), (axis, &extent)| {
            if let Shrink::Fitted { .. } = outcome {
                shape.push(extent);
                return (shape, outcome);
            }
            let row_size = chunk_shape[axis + 1..]
                .iter()
                .fold(element_byte_size.max(1), |size, extent| {
                    size.saturating_mul(*extent)
                });
            let rows = budget / row_size;
            if rows >= 1 {
                shape.push(extent.min(rows));
                (shape, Shrink::Fitted { axis, rows })
            } else {
                shape.push(1);
                (shape, Shrink::Exhausted)
            }
        })
}

/// The chunk geometry planner.
///
/// The planner is a pure function of its configuration and inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkGeometryPlanner {
    buffer_size_policy: BufferSizePolicy,
    chunk_times: NonZeroU64,
}

impl Default for ChunkGeometryPlanner {
    /// Create a planner from the [global configuration](global_config).
    fn default() -> Self {
        Self::from_config(&global_config())
    }
}

impl ChunkGeometryPlanner {
    /// Create a new planner.
    ///
    /// `chunk_times` is the number of chunks per buffer budget, a value of zero is treated as one.
    #[must_use]
    pub fn new(buffer_size_policy: BufferSizePolicy, chunk_times: u64) -> Self {
        Self {
            buffer_size_policy,
            chunk_times: NonZeroU64::new(chunk_times).unwrap_or(NonZeroU64::MIN),
        }
    }

    /// Create a planner from `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.buffer_size_policy(), config.chunk_times())
    }

    /// Plan the chunk geometry of an array.
    ///
    /// - `element_byte_size`: the size in bytes of one scalar element,
    /// - `shape`: the array shape, the entry at `extdim` is ignored,
    /// - `extdim`: the extendable dimension,
    /// - `expected_rows`: the expected number of rows along the extendable dimension,
    /// - `compression_level`: the compression level of the array, which does not alter the geometry.
    ///
    /// # Panics
    /// Panics if `extdim` is out of bounds of `shape`.
    #[must_use]
    pub fn plan(
        &self,
        element_byte_size: u64,
        shape: &[u64],
        extdim: usize,
        expected_rows: u64,
        compression_level: u32,
    ) -> ChunkGeometry {
        assert!(extdim < shape.len(), "extdim is out of bounds");
        let element_byte_size = element_byte_size.max(1);
        let chunk_times = self.chunk_times.get();
        let row_byte_size = shape
            .iter()
            .enumerate()
            .filter(|(axis, _)| *axis != extdim)
            .fold(element_byte_size, |size, (_, extent)| {
                size.saturating_mul((*extent).max(1))
            });
        let budget = self
            .buffer_size_policy
            .buffer_size(expected_rows.saturating_mul(row_byte_size));

        let mut chunk_shape: Vec<u64> = shape.iter().map(|extent| (*extent).max(1)).collect();
        let max_buffer_rows = budget / row_byte_size.saturating_mul(chunk_times);
        if max_buffer_rows >= 1 {
            chunk_shape[extdim] = max_buffer_rows;
            let geometry = ChunkGeometry {
                chunk_shape: to_non_zero(&chunk_shape),
                max_buffer_rows: NonZeroU64::new(max_buffer_rows).unwrap_or(NonZeroU64::MIN),
            };
            log::debug!(
                "planned chunk shape {chunk_shape:?} with {max_buffer_rows} buffer rows (budget {budget} bytes, compression level {compression_level})"
            );
            return geometry;
        }

        chunk_shape[extdim] = 1;
        let (chunk_shape, outcome) = shrink_chunk_shape(element_byte_size, budget, &chunk_shape);
        if outcome == Shrink::Exhausted {
            log::warn!(
                "one element of {element_byte_size} bytes exceeds the buffer budget of {budget} bytes, using chunk shape {chunk_shape:?}"
            );
        }
        let chunk_byte_size = chunk_shape
            .iter()
            .fold(element_byte_size, |size, extent| size.saturating_mul(*extent));
        let max_buffer_rows = budget / chunk_byte_size.saturating_mul(chunk_times);
        let geometry = ChunkGeometry {
            chunk_shape: to_non_zero(&chunk_shape),
            max_buffer_rows: NonZeroU64::new(max_buffer_rows).unwrap_or(NonZeroU64::MIN),
        };
        log::debug!(
            "planned chunk shape {chunk_shape:?} with {} buffer rows after shrinking ({outcome:?}, budget {budget} bytes)",
            geometry.max_buffer_rows
        );
        geometry
    }
}

fn to_non_zero(shape: &[u64]) -> Vec<NonZeroU64> {
    shape
        .iter()
        .map(|extent| NonZeroU64::new(*extent).unwrap_or(NonZeroU64::MIN))
        .collect()
}
