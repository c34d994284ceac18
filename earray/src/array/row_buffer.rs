use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::AtomKind;

/// The byte order of multi-byte elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endianness {
    /// Little endian.
    Little,
    /// Big endian.
    Big,
}

impl Endianness {
    /// The native byte order of the target.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Self = Self::Little;

    /// The native byte order of the target.
    #[cfg(target_endian = "big")]
    pub const NATIVE: Self = Self::Big;

    /// Return the name of the byte order.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Little => "little",
            Self::Big => "big",
        }
    }
}

/// The conversion applied to rows read from an extensible array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReadConversion {
    /// Convert to the native byte order.
    #[default]
    Native,
    /// Return the bytes as stored.
    Raw,
}

/// A buffer of rows: a shape and the bytes of its elements in C order with a byte order.
///
/// Row buffers are the unit of data appended to and read from an [`EArray`](super::EArray).
/// Appending never mutates the bytes of a buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowBuffer<'a> {
    shape: Vec<u64>,
    bytes: Cow<'a, [u8]>,
    byte_order: Endianness,
}

impl<'a> RowBuffer<'a> {
    /// Create a new row buffer.
    ///
    /// The length of `bytes` is validated against `shape` when the buffer is used.
    #[must_use]
    pub fn new(
        shape: impl Into<Vec<u64>>,
        bytes: impl Into<Cow<'a, [u8]>>,
        byte_order: Endianness,
    ) -> Self {
        Self {
            shape: shape.into(),
            bytes: bytes.into(),
            byte_order,
        }
    }

    /// Create a new row buffer in the native byte order.
    #[must_use]
    pub fn new_native(shape: impl Into<Vec<u64>>, bytes: impl Into<Cow<'a, [u8]>>) -> Self {
        Self::new(shape, bytes, Endianness::NATIVE)
    }

    /// The shape of the buffer.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// The bytes of the buffer.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The byte order of the buffer.
    #[must_use]
    pub const fn byte_order(&self) -> Endianness {
        self.byte_order
    }

    /// The number of elements described by the shape of the buffer.
    ///
    /// Returns [`None`] if the element count overflows a [`u64`].
    #[must_use]
    pub fn num_elements(&self) -> Option<u64> {
        self.shape
            .iter()
            .try_fold(1u64, |count, extent| count.checked_mul(*extent))
    }

    /// Consume the buffer and return its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Cow<'a, [u8]> {
        self.bytes
    }

    /// Convert into a buffer owning its bytes.
    #[must_use]
    pub fn into_owned(self) -> RowBuffer<'static> {
        RowBuffer {
            shape: self.shape,
            bytes: Cow::Owned(self.bytes.into_owned()),
            byte_order: self.byte_order,
        }
    }

    /// Convert the buffer to `byte_order`, reversing the `kind` swap units of every element if it differs.
    #[must_use]
    pub fn to_byte_order(mut self, kind: &AtomKind, byte_order: Endianness) -> Self {
        swap_bytes(&mut self.bytes, kind, self.byte_order, byte_order);
        self.byte_order = byte_order;
        self
    }
}

/// Swap the bytes of the elements of `kind` in `bytes` from byte order `from` to `to`.
///
/// `bytes` are only copied if the byte orders differ and the kind has multi-byte swap units.
pub(crate) fn swap_bytes(bytes: &mut Cow<'_, [u8]>, kind: &AtomKind, from: Endianness, to: Endianness) {
    let unit = kind.swap_unit();
    if from != to && unit > 1 {
        for value in bytes.to_mut().chunks_exact_mut(unit) {
            value.reverse();
        }
    }
}
