use std::borrow::Cow;

use super::{BytesFilterTraits, FilterError};

/// A `shuffle` filter.
///
/// Transposes the bytes of fixed size elements so that bytes of equal significance are contiguous.
#[derive(Clone, Debug)]
pub struct ShuffleFilter {
    element_size: usize,
}

impl ShuffleFilter {
    /// Create a new `shuffle` filter for elements of `element_size` bytes.
    #[must_use]
    pub fn new(element_size: usize) -> Self {
        Self {
            element_size: element_size.max(1),
        }
    }

    fn check_length(&self, value: &[u8]) -> Result<(), FilterError> {
        if value.len().is_multiple_of(self.element_size) {
            Ok(())
        } else {
            Err(FilterError::Other(
                "the shuffle filter expects the input byte length to be an integer multiple of the element size"
                    .to_string(),
            ))
        }
    }
}

impl BytesFilterTraits for ShuffleFilter {
    fn name(&self) -> &'static str {
        "shuffle"
    }

    fn encode<'a>(&self, decoded_value: Cow<'a, [u8]>) -> Result<Cow<'a, [u8]>, FilterError> {
        self.check_length(&decoded_value)?;
        let mut encoded_value = vec![0; decoded_value.len()];
        let count = decoded_value.len() / self.element_size;
        for i in 0..count {
            let offset = i * self.element_size;
            for byte_index in 0..self.element_size {
                encoded_value[byte_index * count + i] = decoded_value[offset + byte_index];
            }
        }
        Ok(Cow::Owned(encoded_value))
    }

    fn decode<'a>(&self, encoded_value: Cow<'a, [u8]>) -> Result<Cow<'a, [u8]>, FilterError> {
        self.check_length(&encoded_value)?;
        let mut decoded_value = vec![0; encoded_value.len()];
        let count = encoded_value.len() / self.element_size;
        for byte_index in 0..self.element_size {
            let offset = byte_index * count;
            for i in 0..count {
                decoded_value[i * self.element_size + byte_index] = encoded_value[offset + i];
            }
        }
        Ok(Cow::Owned(decoded_value))
    }
}
