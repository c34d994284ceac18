use std::num::NonZeroU64;
use std::ops::Range;

use thiserror::Error;

/// A row range error.
#[derive(Clone, Debug, Error)]
pub enum RowRangeError {
    /// The start of a single row selection is beyond the last row.
    #[error("start of range ({start}) is greater than number of rows ({nrows})")]
    StartOutOfRange {
        /// The requested start.
        start: i64,
        /// The number of rows.
        nrows: u64,
    },
    /// A negative step.
    #[error("slice step cannot be negative, got {0}")]
    NegativeStep(i64),
    /// A zero step.
    #[error("slice step cannot be zero")]
    ZeroStep,
    /// The range extends beyond the last row.
    #[error("row range {start}..{stop} is out of bounds for {nrows} rows")]
    OutOfBounds {
        /// The start of the range.
        start: u64,
        /// The end of the range.
        stop: u64,
        /// The number of rows.
        nrows: u64,
    },
}

/// A strided range of rows along the extendable dimension: `start`, `start + step`, ... up to `stop` (exclusive).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RowRange {
    start: u64,
    stop: u64,
    step: NonZeroU64,
}

impl From<Range<u64>> for RowRange {
    fn from(range: Range<u64>) -> Self {
        Self {
            start: range.start,
            stop: range.end.max(range.start),
            step: NonZeroU64::MIN,
        }
    }
}

fn clamp_index(index: i64, nrows: u64) -> u64 {
    if index < 0 {
        nrows.saturating_sub(index.unsigned_abs())
    } else {
        index.unsigned_abs().min(nrows)
    }
}

impl RowRange {
    /// Create a new row range.
    ///
    /// A `stop` before `start` is an empty range.
    #[must_use]
    pub fn new(start: u64, stop: u64, step: NonZeroU64) -> Self {
        Self {
            start,
            stop: stop.max(start),
            step,
        }
    }

    /// Normalize an optional `start`, `stop` and `step` against `nrows` rows.
    ///
    /// Indices follow slicing conventions: negative indices count from the end and out of range indices are
    /// clamped.
    /// A `start` without a `stop` selects the single row at `start`, or all rows from the last if `start` is `-1`.
    ///
    /// # Errors
    /// Returns a [`RowRangeError`] if
    ///  - `step` is zero or negative, or
    ///  - a single row selection starts at or beyond `nrows` (for a non-empty array).
    pub fn normalize(
        nrows: u64,
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    ) -> Result<Self, RowRangeError> {
        let (stop, step) = match (start, stop) {
            (Some(start), None) => {
                if nrows > 0 && start >= 0 && start.unsigned_abs() >= nrows {
                    return Err(RowRangeError::StartOutOfRange { start, nrows });
                }
                let stop = if start == -1 { None } else { Some(start + 1) };
                (stop, Some(1))
            }
            _ => (stop, step),
        };
        let step = step.unwrap_or(1);
        if step < 0 {
            return Err(RowRangeError::NegativeStep(step));
        }
        let step = NonZeroU64::new(step.unsigned_abs()).ok_or(RowRangeError::ZeroStep)?;
        let start = start.map_or(0, |start| clamp_index(start, nrows));
        let stop = stop.map_or(nrows, |stop| clamp_index(stop, nrows));
        Ok(Self::new(start, stop, step))
    }

    /// The first row.
    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// The end of the range (exclusive).
    #[must_use]
    pub const fn stop(&self) -> u64 {
        self.stop
    }

    /// The step between rows.
    #[must_use]
    pub const fn step(&self) -> NonZeroU64 {
        self.step
    }

    /// The number of rows in the range.
    #[must_use]
    pub fn num_rows(&self) -> u64 {
        (self.stop - self.start).div_ceil(self.step.get())
    }

    /// Returns true if the range has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }

    /// Check that the range lies within `nrows` rows.
    ///
    /// # Errors
    /// Returns [`RowRangeError::OutOfBounds`] if the range ends beyond `nrows`.
    pub fn validate(&self, nrows: u64) -> Result<(), RowRangeError> {
        if self.stop > nrows {
            Err(RowRangeError::OutOfBounds {
                start: self.start,
                stop: self.stop,
                nrows,
            })
        } else {
            Ok(())
        }
    }

    /// Return a cursor over windows of at most `window_rows` selected rows.
    #[must_use]
    pub fn cursor(&self, window_rows: NonZeroU64) -> RowCursor {
        RowCursor {
            range: *self,
            stride: self.step.get().saturating_mul(window_rows.get()),
            position: self.start,
        }
    }
}

/// A cursor over consecutive windows of a [`RowRange`].
///
/// Each window is a [`RowRange`] with the step of the traversed range, covering a stride of `step * window_rows`
/// rows.
#[derive(Clone, Debug)]
pub struct RowCursor {
    range: RowRange,
    stride: u64,
    position: u64,
}

impl RowCursor {
    /// The range traversed by the cursor.
    #[must_use]
    pub const fn range(&self) -> &RowRange {
        &self.range
    }
}

impl Iterator for RowCursor {
    type Item = RowRange;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.range.stop {
            return None;
        }
        let stop = self
            .position
            .saturating_add(self.stride)
            .min(self.range.stop);
        let window = RowRange::new(self.position, stop, self.range.step);
        self.position = stop;
        Some(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u64, stop: u64, step: u64) -> RowRange {
        RowRange::new(start, stop, NonZeroU64::new(step).unwrap())
    }

    #[test]
    fn row_range_normalize() {
        assert_eq!(RowRange::normalize(10, None, None, None).unwrap(), range(0, 10, 1));
        assert_eq!(
            RowRange::normalize(10, Some(2), Some(8), Some(3)).unwrap(),
            range(2, 8, 3)
        );
        assert_eq!(
            RowRange::normalize(10, Some(-3), None, None).unwrap(),
            range(7, 8, 1)
        );
        assert_eq!(
            RowRange::normalize(10, Some(-1), None, Some(5)).unwrap(),
            range(9, 10, 1)
        );
        assert_eq!(
            RowRange::normalize(10, Some(-20), Some(100), None).unwrap(),
            range(0, 10, 1)
        );
        assert_eq!(
            RowRange::normalize(10, Some(4), Some(-8), None).unwrap(),
            range(4, 4, 1)
        );
        assert_eq!(
            RowRange::normalize(0, Some(3), None, None).unwrap(),
            range(0, 0, 1)
        );
    }

    #[test]
    fn row_range_normalize_errors() {
        assert!(matches!(
            RowRange::normalize(10, Some(10), None, None),
            Err(RowRangeError::StartOutOfRange { start: 10, nrows: 10 })
        ));
        assert!(matches!(
            RowRange::normalize(10, None, None, Some(-1)),
            Err(RowRangeError::NegativeStep(-1))
        ));
        assert!(matches!(
            RowRange::normalize(10, None, None, Some(0)),
            Err(RowRangeError::ZeroStep)
        ));
    }

    #[test]
    fn row_range_num_rows() {
        assert_eq!(range(0, 10, 1).num_rows(), 10);
        assert_eq!(range(0, 10, 3).num_rows(), 4);
        assert_eq!(range(5, 5, 1).num_rows(), 0);
        assert!(RowRange::from(5..2).is_empty());
        assert!(range(0, 11, 1).validate(10).is_err());
        assert!(range(0, 10, 1).validate(10).is_ok());
    }

    #[test]
    fn row_cursor() {
        let windows: Vec<RowRange> = range(1, 20, 2)
            .cursor(NonZeroU64::new(3).unwrap())
            .collect();
        assert_eq!(windows, vec![range(1, 7, 2), range(7, 13, 2), range(13, 19, 2), range(19, 20, 2)]);
        let rows: u64 = windows.iter().map(RowRange::num_rows).sum();
        assert_eq!(rows, range(1, 20, 2).num_rows());

        assert_eq!(range(3, 3, 1).cursor(NonZeroU64::MIN).count(), 0);
    }
}
