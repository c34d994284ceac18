use std::ops::Range;

use itertools::Itertools;

/// A rectangular subset of an array: a start index and a shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ArraySubset {
    start: Vec<u64>,
    shape: Vec<u64>,
}

impl ArraySubset {
    /// Create a new subset from `ranges`, one per dimension.
    pub(crate) fn new_with_ranges(ranges: &[Range<u64>]) -> Self {
        Self {
            start: ranges.iter().map(|range| range.start).collect(),
            shape: ranges
                .iter()
                .map(|range| range.end.saturating_sub(range.start))
                .collect(),
        }
    }

    pub(crate) fn start(&self) -> &[u64] {
        &self.start
    }

    pub(crate) fn shape(&self) -> &[u64] {
        &self.shape
    }

    pub(crate) fn end_exc(&self) -> Vec<u64> {
        std::iter::zip(&self.start, &self.shape)
            .map(|(start, shape)| start + shape)
            .collect()
    }

    /// Return the overlap of `self` and `other`, if any.
    pub(crate) fn overlap(&self, other: &Self) -> Option<Self> {
        let ranges: Vec<Range<u64>> = itertools::izip!(self.start(), self.end_exc(), other.start(), other.end_exc())
            .map(|(start_a, end_a, start_b, end_b)| *start_a.max(start_b)..end_a.min(end_b))
            .collect();
        if ranges.iter().any(|range| range.start >= range.end) {
            None
        } else {
            Some(Self::new_with_ranges(&ranges))
        }
    }

    /// Return the subset translated so that `origin` is the zero index.
    pub(crate) fn relative_to(&self, origin: &[u64]) -> Self {
        Self {
            start: std::iter::zip(&self.start, origin)
                .map(|(start, origin)| start - origin)
                .collect(),
            shape: self.shape.clone(),
        }
    }

    /// Return the byte ranges of the subset within an array with `array_shape` and elements of `element_size`
    /// bytes, in C order.
    ///
    /// Each range covers the innermost dimension of the subset.
    pub(crate) fn byte_ranges(&self, array_shape: &[u64], element_size: usize) -> Vec<Range<usize>> {
        let Some((&last_start, outer_start)) = self.start.split_last() else {
            return vec![];
        };
        let (&last_len, outer_shape) = self.shape.split_last().unwrap_or((&0, &[]));
        if last_len == 0 || outer_shape.contains(&0) {
            return vec![];
        }
        let strides = c_strides(array_shape);
        let run_bytes = to_usize(last_len) * element_size;
        let offset = |outer_indices: &[u64]| {
            let element_index = std::iter::zip(outer_indices, &strides)
                .map(|(index, stride)| index * stride)
                .sum::<u64>()
                + last_start;
            let start = to_usize(element_index) * element_size;
            start..start + run_bytes
        };
        if outer_start.is_empty() {
            return vec![offset(&[])];
        }
        std::iter::zip(outer_start, outer_shape)
            .map(|(start, len)| *start..start + len)
            .multi_cartesian_product()
            .map(|indices| offset(&indices))
            .collect()
    }
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

fn c_strides(shape: &[u64]) -> Vec<u64> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Iterate over the indices of every element of the grid within `ranges` in C order.
pub(crate) fn indices_in(ranges: &[Range<u64>]) -> Vec<Vec<u64>> {
    if ranges.is_empty() || ranges.iter().any(|range| range.start >= range.end) {
        return vec![];
    }
    ranges.iter().cloned().multi_cartesian_product().collect()
}

/// Copy the `src_subset` of `src` (an array with `src_shape`) into the `dst_subset` of `dst` (an array with
/// `dst_shape`).
///
/// Both subsets must have the same shape.
pub(crate) fn copy_subset(
    src: &[u8],
    src_shape: &[u64],
    src_subset: &ArraySubset,
    dst: &mut [u8],
    dst_shape: &[u64],
    dst_subset: &ArraySubset,
    element_size: usize,
) {
    debug_assert_eq!(src_subset.shape(), dst_subset.shape());
    for (src_range, dst_range) in std::iter::zip(
        src_subset.byte_ranges(src_shape, element_size),
        dst_subset.byte_ranges(dst_shape, element_size),
    ) {
        dst[dst_range].copy_from_slice(&src[src_range]);
    }
}

/// Zero the `subset` of `dst` (an array with `dst_shape`).
pub(crate) fn zero_subset(dst: &mut [u8], dst_shape: &[u64], subset: &ArraySubset, element_size: usize) {
    for range in subset.byte_ranges(dst_shape, element_size) {
        dst[range].fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_subset_overlap() {
        let a = ArraySubset::new_with_ranges(&[0..4, 2..6]);
        let b = ArraySubset::new_with_ranges(&[3..8, 0..3]);
        assert_eq!(
            a.overlap(&b),
            Some(ArraySubset::new_with_ranges(&[3..4, 2..3]))
        );
        let c = ArraySubset::new_with_ranges(&[4..5, 0..6]);
        assert_eq!(a.overlap(&c), None);
        assert_eq!(
            ArraySubset::new_with_ranges(&[3..4, 2..3]).relative_to(&[2, 2]),
            ArraySubset::new_with_ranges(&[1..2, 0..1])
        );
    }

    #[test]
    fn array_subset_byte_ranges() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        assert_eq!(subset.byte_ranges(&[4, 4], 2), vec![10..14, 18..22]);
        let subset = ArraySubset::new_with_ranges(&[2..5]);
        assert_eq!(subset.byte_ranges(&[8], 1), vec![2..5]);
        assert_eq!(ArraySubset::new_with_ranges(&[0..0, 0..4]).byte_ranges(&[0, 4], 1), vec![]);
    }

    #[test]
    fn array_subset_copy() {
        // copy the centre of a 4x4 array into the corner of a 3x3 array
        let src: Vec<u8> = (0..16).collect();
        let mut dst = vec![0u8; 9];
        copy_subset(
            &src,
            &[4, 4],
            &ArraySubset::new_with_ranges(&[1..3, 1..3]),
            &mut dst,
            &[3, 3],
            &ArraySubset::new_with_ranges(&[0..2, 0..2]),
            1,
        );
        assert_eq!(dst, vec![5, 6, 0, 9, 10, 0, 0, 0, 0]);

        zero_subset(&mut dst, &[3, 3], &ArraySubset::new_with_ranges(&[1..2, 0..3]), 1);
        assert_eq!(dst, vec![5, 6, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn grid_indices() {
        assert_eq!(
            indices_in(&[0..2, 1..3]),
            vec![vec![0, 1], vec![0, 2], vec![1, 1], vec![1, 2]]
        );
        assert!(indices_in(&[0..2, 1..1]).is_empty());
    }
}
