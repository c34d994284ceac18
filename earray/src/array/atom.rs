//! Atoms: descriptors of one element of an extensible array.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ElementError, Endianness};

/// An integer kind, the base of an [`EnumType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegerKind {
    /// `int8`
    Int8,
    /// `int16`
    Int16,
    /// `int32`
    Int32,
    /// `int64`
    Int64,
    /// `uint8`
    #[serde(rename = "uint8")]
    UInt8,
    /// `uint16`
    #[serde(rename = "uint16")]
    UInt16,
    /// `uint32`
    #[serde(rename = "uint32")]
    UInt32,
    /// `uint64`
    #[serde(rename = "uint64")]
    UInt64,
}

impl IntegerKind {
    /// The size of the integer in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 => 4,
            Self::Int64 | Self::UInt64 => 8,
        }
    }

    /// The inclusive range of values representable by the integer kind.
    #[must_use]
    pub const fn range(self) -> (i128, i128) {
        match self {
            Self::Int8 => (i8::MIN as i128, i8::MAX as i128),
            Self::Int16 => (i16::MIN as i128, i16::MAX as i128),
            Self::Int32 => (i32::MIN as i128, i32::MAX as i128),
            Self::Int64 => (i64::MIN as i128, i64::MAX as i128),
            Self::UInt8 => (0, u8::MAX as i128),
            Self::UInt16 => (0, u16::MAX as i128),
            Self::UInt32 => (0, u32::MAX as i128),
            Self::UInt64 => (0, u64::MAX as i128),
        }
    }

    /// Decode one integer of this kind from `bytes` with byte order `endianness`.
    ///
    /// `bytes` must have a length of [`size`](IntegerKind::size).
    fn decode(self, bytes: &[u8], endianness: Endianness) -> i128 {
        let mut le = [0u8; 8];
        le[..bytes.len()].copy_from_slice(bytes);
        if endianness == Endianness::Big {
            le[..bytes.len()].reverse();
        }
        let unsigned = u64::from_le_bytes(le);
        let bits = 8 * self.size() as u32;
        match self {
            Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64 => i128::from(unsigned),
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 => {
                // sign extend
                let shift = 64 - bits;
                i128::from((unsigned << shift).cast_signed() >> shift)
            }
        }
    }
}

/// An enumerated type: an integer base and an ordered mapping of names to values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EnumTypeMembers")]
pub struct EnumType {
    base: IntegerKind,
    members: Vec<(String, i64)>,
}

#[derive(Deserialize)]
struct EnumTypeMembers {
    base: IntegerKind,
    members: Vec<(String, i64)>,
}

impl TryFrom<EnumTypeMembers> for EnumType {
    type Error = EnumTypeError;

    fn try_from(value: EnumTypeMembers) -> Result<Self, Self::Error> {
        Self::new(value.base, value.members)
    }
}

/// An enumerated type creation error.
#[derive(Clone, Debug, Error)]
pub enum EnumTypeError {
    /// The enumerated type has no members.
    #[error("an enumerated type must have at least one member")]
    Empty,
    /// A name is used more than once.
    #[error("enumerated type name `{0}` is duplicated")]
    DuplicateName(String),
    /// A value is used more than once.
    #[error("enumerated type value {0} is duplicated")]
    DuplicateValue(i64),
    /// A value cannot be represented by the base integer kind.
    #[error("enumerated type value {value} of `{name}` is out of range for base {base:?}")]
    ValueOutOfRange {
        /// The member name.
        name: String,
        /// The member value.
        value: i64,
        /// The base integer kind.
        base: IntegerKind,
    },
}

impl EnumType {
    /// Create a new enumerated type from a `base` integer kind and `(name, value)` members.
    ///
    /// # Errors
    /// Returns an [`EnumTypeError`] if there are no members, a name or value is duplicated, or a value is not
    /// representable by `base`.
    pub fn new<S: Into<String>>(
        base: IntegerKind,
        members: impl IntoIterator<Item = (S, i64)>,
    ) -> Result<Self, EnumTypeError> {
        let members: Vec<(String, i64)> = members
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
        if members.is_empty() {
            return Err(EnumTypeError::Empty);
        }
        let (min, max) = base.range();
        for (i, (name, value)) in members.iter().enumerate() {
            if !(min..=max).contains(&i128::from(*value)) {
                return Err(EnumTypeError::ValueOutOfRange {
                    name: name.clone(),
                    value: *value,
                    base,
                });
            }
            for (other_name, other_value) in &members[..i] {
                if other_name == name {
                    return Err(EnumTypeError::DuplicateName(name.clone()));
                }
                if other_value == value {
                    return Err(EnumTypeError::DuplicateValue(*value));
                }
            }
        }
        Ok(Self { base, members })
    }

    /// The base integer kind.
    #[must_use]
    pub const fn base(&self) -> IntegerKind {
        self.base
    }

    /// The `(name, value)` members in definition order.
    pub fn members(&self) -> impl Iterator<Item = (&str, i64)> {
        self.members
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }

    /// Return the value of the member `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<i64> {
        self.members().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Return the name of the member with `value`.
    #[must_use]
    pub fn name(&self, value: i64) -> Option<&str> {
        self.members().find(|(_, v)| *v == value).map(|(n, _)| n)
    }

    fn contains(&self, value: i128) -> bool {
        self.members
            .iter()
            .any(|(_, member)| i128::from(*member) == value)
    }
}

/// The kind of the scalar element of an [`Atom`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AtomKind {
    /// A boolean stored as one byte, `0` or `1`.
    Bool,
    /// `int8`
    Int8,
    /// `int16`
    Int16,
    /// `int32`
    Int32,
    /// `int64`
    Int64,
    /// `uint8`
    #[serde(rename = "uint8")]
    UInt8,
    /// `uint16`
    #[serde(rename = "uint16")]
    UInt16,
    /// `uint32`
    #[serde(rename = "uint32")]
    UInt32,
    /// `uint64`
    #[serde(rename = "uint64")]
    UInt64,
    /// IEEE 754 single precision.
    Float32,
    /// IEEE 754 double precision.
    Float64,
    /// A complex number of two [`Float32`](AtomKind::Float32) components.
    Complex64,
    /// A complex number of two [`Float64`](AtomKind::Float64) components.
    Complex128,
    /// A fixed-length byte string.
    String {
        /// The length of the string in bytes.
        length: u64,
    },
    /// An enumerated type.
    Enum(EnumType),
    /// Seconds since the epoch as a 32-bit signed integer.
    Time32,
    /// Seconds since the epoch as a 64-bit float with microsecond resolution.
    Time64,
}

impl From<IntegerKind> for AtomKind {
    fn from(kind: IntegerKind) -> Self {
        match kind {
            IntegerKind::Int8 => Self::Int8,
            IntegerKind::Int16 => Self::Int16,
            IntegerKind::Int32 => Self::Int32,
            IntegerKind::Int64 => Self::Int64,
            IntegerKind::UInt8 => Self::UInt8,
            IntegerKind::UInt16 => Self::UInt16,
            IntegerKind::UInt32 => Self::UInt32,
            IntegerKind::UInt64 => Self::UInt64,
        }
    }
}

impl AtomKind {
    /// The name of the kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Int8 => "Int8",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::UInt8 => "UInt8",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::Complex64 => "Complex64",
            Self::Complex128 => "Complex128",
            Self::String { .. } => "String",
            Self::Enum(_) => "Enum",
            Self::Time32 => "Time32",
            Self::Time64 => "Time64",
        }
    }

    /// The size in bytes of one scalar element.
    #[must_use]
    pub fn element_byte_size(&self) -> u64 {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 | Self::Time32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 | Self::Complex64 | Self::Time64 => 8,
            Self::Complex128 => 16,
            Self::String { length } => *length,
            Self::Enum(enum_type) => enum_type.base().size() as u64,
        }
    }

    /// The size in bytes of the units reversed when changing byte order.
    ///
    /// Complex numbers swap each component, strings and single byte kinds never swap.
    #[must_use]
    pub fn swap_unit(&self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 | Self::String { .. } => 1,
            Self::Complex64 => 4,
            Self::Complex128 => 8,
            Self::Enum(enum_type) => enum_type.base().size(),
            Self::Int16
            | Self::UInt16
            | Self::Int32
            | Self::UInt32
            | Self::Float32
            | Self::Time32
            | Self::Int64
            | Self::UInt64
            | Self::Float64
            | Self::Time64 => self.size_of_scalar(),
        }
    }

    fn size_of_scalar(&self) -> usize {
        usize::try_from(self.element_byte_size()).unwrap_or(usize::MAX)
    }

    /// The kind holding the element values.
    ///
    /// This is the base integer kind for an enumerated kind, otherwise `self`.
    #[must_use]
    pub fn value_kind(&self) -> Cow<'_, Self> {
        match self {
            Self::Enum(enum_type) => Cow::Owned(Self::from(enum_type.base())),
            _ => Cow::Borrowed(self),
        }
    }

    /// Validate and normalize element `bytes` with byte order `endianness`.
    ///
    /// - [`Bool`](AtomKind::Bool) values must be `0` or `1`.
    /// - [`Enum`](AtomKind::Enum) values must be members of the enumerated type.
    /// - [`Time64`](AtomKind::Time64) values are rounded to microsecond resolution.
    ///
    /// `bytes` are only copied if a value changes.
    ///
    /// # Errors
    /// Returns [`ElementError::InvalidElementValue`] if a value is not valid for the kind.
    pub fn normalize(
        &self,
        bytes: &mut Cow<'_, [u8]>,
        endianness: Endianness,
    ) -> Result<(), ElementError> {
        match self {
            Self::Bool => {
                if let Some(value) = bytes.iter().find(|value| **value > 1) {
                    return Err(ElementError::InvalidElementValue {
                        kind: self.name(),
                        reason: format!("{value} is not a boolean"),
                    });
                }
            }
            Self::Enum(enum_type) => {
                let size = enum_type.base().size();
                for value in bytes.chunks_exact(size) {
                    let value = enum_type.base().decode(value, endianness);
                    if !enum_type.contains(value) {
                        return Err(ElementError::InvalidElementValue {
                            kind: self.name(),
                            reason: format!("{value} is not a member of the enumerated type"),
                        });
                    }
                }
            }
            Self::Time64 => {
                let needs_rounding = bytes.chunks_exact(8).any(|value| {
                    let value = decode_f64(value, endianness);
                    round_to_microseconds(value).to_bits() != value.to_bits()
                });
                if needs_rounding {
                    for value in bytes.to_mut().chunks_exact_mut(8) {
                        let rounded = round_to_microseconds(decode_f64(value, endianness));
                        value.copy_from_slice(&match endianness {
                            Endianness::Little => rounded.to_le_bytes(),
                            Endianness::Big => rounded.to_be_bytes(),
                        });
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn decode_f64(bytes: &[u8], endianness: Endianness) -> f64 {
    let mut value = [0u8; 8];
    value.copy_from_slice(bytes);
    match endianness {
        Endianness::Little => f64::from_le_bytes(value),
        Endianness::Big => f64::from_be_bytes(value),
    }
}

fn round_to_microseconds(value: f64) -> f64 {
    if value.is_finite() {
        (value * 1e6).round() / 1e6
    } else {
        value
    }
}

/// An atom: the kind and base shape of the elements of an extensible array.
///
/// Exactly one entry of the base shape of an atom used to create an extensible array must be `0`.
/// This marks the extendable dimension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Atom {
    kind: AtomKind,
    base_shape: Vec<u64>,
}

impl Atom {
    /// Create a new atom.
    #[must_use]
    pub fn new(kind: AtomKind, base_shape: impl Into<Vec<u64>>) -> Self {
        Self {
            kind,
            base_shape: base_shape.into(),
        }
    }

    /// Reconstruct an atom from persisted metadata: the stored `kind` and full `shape` with extendable dimension
    /// `extdim`.
    ///
    /// The extent of the extendable dimension is replaced by `0`.
    #[must_use]
    pub fn from_metadata(kind: &AtomKind, shape: &[u64], extdim: usize) -> Self {
        let mut base_shape = shape.to_vec();
        if let Some(extent) = base_shape.get_mut(extdim) {
            *extent = 0;
        }
        Self::new(kind.clone(), base_shape)
    }

    /// The element kind.
    #[must_use]
    pub const fn kind(&self) -> &AtomKind {
        &self.kind
    }

    /// The base shape.
    #[must_use]
    pub fn base_shape(&self) -> &[u64] {
        &self.base_shape
    }

    /// The size in bytes of one scalar element.
    #[must_use]
    pub fn element_byte_size(&self) -> u64 {
        self.kind.element_byte_size()
    }

    /// The size in bytes of one row along the extendable dimension.
    ///
    /// This is the element byte size times the product of the non-zero base shape entries.
    #[must_use]
    pub fn row_byte_size(&self) -> u64 {
        self.base_shape
            .iter()
            .filter(|extent| **extent != 0)
            .product::<u64>()
            * self.element_byte_size()
    }

    /// The indices of the zero (extendable) entries of the base shape.
    #[must_use]
    pub fn zero_dimensions(&self) -> Vec<usize> {
        self.base_shape
            .iter()
            .enumerate()
            .filter_map(|(i, extent)| (*extent == 0).then_some(i))
            .collect()
    }
}

impl std::fmt::Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            AtomKind::String { length } => write!(
                f,
                "StringAtom(shape={:?}, length={length})",
                self.base_shape
            ),
            AtomKind::Enum(enum_type) => write!(
                f,
                "EnumAtom(shape={:?}, base={:?}, members={})",
                self.base_shape,
                enum_type.base(),
                enum_type.members.len()
            ),
            kind => write!(f, "{}Atom(shape={:?})", kind.name(), self.base_shape),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> EnumType {
        EnumType::new(IntegerKind::UInt8, [("red", 0), ("green", 1), ("blue", 2)]).unwrap()
    }

    #[test]
    fn atom_sizes() {
        let atom = Atom::new(AtomKind::Float64, [0, 4]);
        assert_eq!(atom.element_byte_size(), 8);
        assert_eq!(atom.row_byte_size(), 32);
        assert_eq!(atom.zero_dimensions(), vec![0]);

        let atom = Atom::new(AtomKind::String { length: 16 }, [3, 0]);
        assert_eq!(atom.element_byte_size(), 16);
        assert_eq!(atom.row_byte_size(), 48);
        assert_eq!(atom.kind().swap_unit(), 1);

        let atom = Atom::new(AtomKind::Enum(colors()), [0]);
        assert_eq!(atom.element_byte_size(), 1);
        assert_eq!(atom.kind().value_kind().as_ref(), &AtomKind::UInt8);

        assert_eq!(AtomKind::Complex128.swap_unit(), 8);
        assert_eq!(AtomKind::Time64.swap_unit(), 8);
    }

    #[test]
    fn atom_from_metadata() {
        let atom = Atom::from_metadata(&AtomKind::Int32, &[5, 2], 0);
        assert_eq!(atom.base_shape(), &[0, 2]);
        assert_eq!(atom.to_string(), "Int32Atom(shape=[0, 2])");
    }

    #[test]
    fn enum_type() {
        let colors = colors();
        assert_eq!(colors.value("green"), Some(1));
        assert_eq!(colors.name(2), Some("blue"));
        assert_eq!(colors.name(3), None);
        assert!(matches!(
            EnumType::new(IntegerKind::UInt8, [("a", 0), ("a", 1)]),
            Err(EnumTypeError::DuplicateName(_))
        ));
        assert!(matches!(
            EnumType::new(IntegerKind::UInt8, [("a", 0), ("b", 0)]),
            Err(EnumTypeError::DuplicateValue(0))
        ));
        assert!(matches!(
            EnumType::new(IntegerKind::UInt8, [("a", -1)]),
            Err(EnumTypeError::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            EnumType::new::<&str>(IntegerKind::Int8, []),
            Err(EnumTypeError::Empty)
        ));
    }

    #[test]
    fn atom_kind_serde() {
        let kind = AtomKind::Enum(colors());
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(
            json,
            r#"{"type":"enum","base":"uint8","members":[["red",0],["green",1],["blue",2]]}"#
        );
        assert_eq!(serde_json::from_str::<AtomKind>(&json).unwrap(), kind);

        let kind = AtomKind::String { length: 8 };
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, r#"{"type":"string","length":8}"#);
        assert_eq!(serde_json::from_str::<AtomKind>(&json).unwrap(), kind);

        assert_eq!(
            serde_json::to_string(&AtomKind::UInt16).unwrap(),
            r#"{"type":"uint16"}"#
        );
        assert!(
            serde_json::from_str::<AtomKind>(
                r#"{"type":"enum","base":"uint8","members":[["a",0],["b",0]]}"#
            )
            .is_err()
        );
    }

    #[test]
    fn normalize_bool_and_enum() {
        let mut bytes = Cow::Borrowed(&[0u8, 1, 1][..]);
        assert!(
            AtomKind::Bool
                .normalize(&mut bytes, Endianness::Little)
                .is_ok()
        );
        let mut bytes = Cow::Borrowed(&[0u8, 2][..]);
        assert!(
            AtomKind::Bool
                .normalize(&mut bytes, Endianness::Little)
                .is_err()
        );

        let kind = AtomKind::Enum(colors());
        let mut bytes = Cow::Borrowed(&[2u8, 0][..]);
        assert!(kind.normalize(&mut bytes, Endianness::Little).is_ok());
        let mut bytes = Cow::Borrowed(&[3u8][..]);
        assert!(kind.normalize(&mut bytes, Endianness::Little).is_err());

        let kind = AtomKind::Enum(EnumType::new(IntegerKind::Int16, [("low", -300)]).unwrap());
        let low = (-300i16).to_be_bytes();
        let mut bytes = Cow::Borrowed(&low[..]);
        assert!(kind.normalize(&mut bytes, Endianness::Big).is_ok());
    }

    #[test]
    fn normalize_time64_copies_on_change() {
        let values = [1.5f64.to_le_bytes(), 2.000_000_4f64.to_le_bytes()].concat();
        let mut bytes = Cow::Borrowed(values.as_slice());
        AtomKind::Time64
            .normalize(&mut bytes, Endianness::Little)
            .unwrap();
        assert!(matches!(bytes, Cow::Owned(_)));
        assert_eq!(decode_f64(&bytes[8..], Endianness::Little), 2.0);
        assert_eq!(decode_f64(&values[8..], Endianness::Little), 2.000_000_4);

        let values = 1.25f64.to_le_bytes();
        let mut bytes = Cow::Borrowed(&values[..]);
        AtomKind::Time64
            .normalize(&mut bytes, Endianness::Little)
            .unwrap();
        assert!(matches!(bytes, Cow::Borrowed(_)));
    }
}
