use std::borrow::Cow;

use thiserror::Error;

use super::{AtomKind, transmute_from_bytes_vec, transmute_to_bytes};

/// An element error.
#[derive(Clone, Debug, Error)]
pub enum ElementError {
    /// The element type is incompatible with the atom kind.
    #[error("the element type `{element}` is incompatible with atom kind `{kind}`")]
    IncompatibleElementType {
        /// The element type name.
        element: &'static str,
        /// The atom kind name.
        kind: &'static str,
    },
    /// An element value is not valid for the atom kind.
    ///
    /// For example
    ///  - a bool value not equal to 0 (false) or 1 (true), or
    ///  - an enumerated value that is not a member of the enumerated type.
    #[error("invalid `{kind}` element value: {reason}")]
    InvalidElementValue {
        /// The atom kind name.
        kind: &'static str,
        /// The reason the value is invalid.
        reason: String,
    },
}

/// A trait for a type that can be appended to an extensible array.
pub trait Element: Sized {
    /// Validate that the element type is compatible with the atom `kind`.
    ///
    /// # Errors
    /// Returns [`ElementError::IncompatibleElementType`] if the element type is incompatible with `kind`.
    fn validate_atom_kind(kind: &AtomKind) -> Result<(), ElementError>;

    /// Convert elements to bytes in the native byte order.
    fn to_bytes(elements: &[Self]) -> Cow<'_, [u8]>;
}

/// A trait for a type that can be read from an extensible array.
pub trait ElementOwned: Element {
    /// Convert bytes in the native byte order to elements.
    fn from_bytes(bytes: Vec<u8>) -> Vec<Self>;
}

fn incompatible<T>(kind: &AtomKind) -> ElementError {
    ElementError::IncompatibleElementType {
        element: std::any::type_name::<T>(),
        kind: kind.name(),
    }
}

macro_rules! impl_element_pod {
    ($raw_type:ty, $($pattern:pat),+) => {
        impl Element for $raw_type {
            fn validate_atom_kind(kind: &AtomKind) -> Result<(), ElementError> {
                match kind.value_kind().as_ref() {
                    $($pattern)|+ => Ok(()),
                    _ => Err(incompatible::<$raw_type>(kind)),
                }
            }

            fn to_bytes(elements: &[Self]) -> Cow<'_, [u8]> {
                Cow::Borrowed(transmute_to_bytes(elements))
            }
        }

        impl ElementOwned for $raw_type {
            fn from_bytes(bytes: Vec<u8>) -> Vec<Self> {
                transmute_from_bytes_vec(bytes)
            }
        }
    };
}

impl_element_pod!(i8, AtomKind::Int8);
impl_element_pod!(i16, AtomKind::Int16);
impl_element_pod!(i32, AtomKind::Int32, AtomKind::Time32);
impl_element_pod!(i64, AtomKind::Int64);
impl_element_pod!(u8, AtomKind::UInt8, AtomKind::String { .. });
impl_element_pod!(u16, AtomKind::UInt16);
impl_element_pod!(u32, AtomKind::UInt32);
impl_element_pod!(u64, AtomKind::UInt64);
impl_element_pod!(f32, AtomKind::Float32);
impl_element_pod!(f64, AtomKind::Float64, AtomKind::Time64);
impl_element_pod!(num_complex::Complex32, AtomKind::Complex64);
impl_element_pod!(num_complex::Complex64, AtomKind::Complex128);

impl Element for bool {
    fn validate_atom_kind(kind: &AtomKind) -> Result<(), ElementError> {
        match kind {
            AtomKind::Bool => Ok(()),
            _ => Err(incompatible::<Self>(kind)),
        }
    }

    fn to_bytes(elements: &[Self]) -> Cow<'_, [u8]> {
        Cow::Owned(elements.iter().map(|value| u8::from(*value)).collect())
    }
}

impl ElementOwned for bool {
    fn from_bytes(bytes: Vec<u8>) -> Vec<Self> {
        bytes.into_iter().map(|value| value != 0).collect()
    }
}
