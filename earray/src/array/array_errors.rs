use thiserror::Error;

use super::{ElementError, FilterError, RowRangeError};
use crate::{
    container::ContainerError,
    node::{NodePath, NodePathError},
    storage::StorageError,
};

/// An extensible array creation error.
///
/// Returned when creating an array with an [`EArrayBuilder`](super::EArrayBuilder) or opening an array with
/// [`EArray::open`](super::EArray::open).
#[derive(Clone, Debug, Error)]
pub enum EArrayCreateError {
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// The container is not writable.
    #[error(transparent)]
    ContainerError(#[from] ContainerError),
    /// The atom does not have an array shape.
    #[error("the shape of the `{0}` atom must be an array shape with an extendable dimension, got a scalar shape")]
    InvalidAtomShape(&'static str),
    /// The atom has a zero byte size.
    #[error("the `{0}` atom has a zero element byte size")]
    ZeroSizedAtom(&'static str),
    /// The atom shape has no extendable dimension.
    #[error("one of the dimensions of the atom shape {0:?} must be zero to mark the extendable dimension")]
    NoExtendableDimension(Vec<u64>),
    /// The atom shape has more than one extendable dimension.
    #[error("multiple extendable (zero) dimensions are not supported, got atom shape {0:?}")]
    MultipleExtendableDimensions(Vec<u64>),
    /// A persisted array has no valid extendable dimension.
    #[error("array `{0}` has no extendable dimension, the metadata is corrupt or incompatible")]
    MissingExtendableDimension(NodePath),
    /// Missing metadata.
    #[error("array metadata is missing at `{0}`")]
    MissingMetadata(NodePath),
    /// Invalid metadata.
    #[error("invalid metadata for array `{0}`: {1}")]
    InvalidMetadata(NodePath, String),
    /// A node already exists at the path.
    #[error("a node already exists at `{0}`")]
    NodeExists(NodePath),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A filter error.
    #[error(transparent)]
    FilterError(#[from] FilterError),
}

/// Extensible array errors.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum EArrayError {
    /// The container is not writable.
    #[error(transparent)]
    ContainerError(#[from] ContainerError),
    /// The rank of an appended buffer differs from the rank of the array.
    #[error("the rank of the appended buffer ({buffer_rank}) and the `{path}` array ({array_rank}) differ")]
    RankMismatch {
        /// The array path.
        path: NodePath,
        /// The rank of the buffer.
        buffer_rank: usize,
        /// The rank of the array.
        array_rank: usize,
    },
    /// The extent of an appended buffer differs from the array in a non-extendable dimension.
    #[error("the shapes of the appended buffer and the `{path}` array differ in non-extendable dimension {axis}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The array path.
        path: NodePath,
        /// The offending axis.
        axis: usize,
        /// The extent of the array.
        expected: u64,
        /// The extent of the buffer.
        actual: u64,
    },
    /// The byte size of an appended buffer or the extended array overflows.
    #[error("the shape {_0:?} exceeds the addressable size of an array")]
    ShapeOverflow(Vec<u64>),
    /// An unexpected bytes input size.
    #[error("got bytes with size {_0:?}, expected {_1:?}")]
    InvalidBytesInputSize(usize, u64),
    /// An element error.
    #[error(transparent)]
    ElementError(#[from] ElementError),
    /// An invalid truncation size.
    #[error("truncation size must be greater than 0")]
    InvalidTruncateSize,
    /// The array is not enumerated.
    #[error("array `{0}` is not of an enumerated type")]
    NotEnumerated(NodePath),
    /// A row range error.
    #[error(transparent)]
    RowRangeError(#[from] RowRangeError),
    /// An unexpected chunk decoded size.
    #[error("got chunk decoded size {_0:?}, expected {_1:?}")]
    UnexpectedChunkDecodedSize(usize, usize),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A filter error.
    #[error(transparent)]
    FilterError(#[from] FilterError),
    /// An array creation error.
    #[error(transparent)]
    CreateError(#[from] EArrayCreateError),
    /// Any other error.
    #[error("{_0}")]
    Other(String),
}
