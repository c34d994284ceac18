use std::borrow::Cow;

use super::{BytesFilterTraits, FilterError};

const CHECKSUM_SIZE: usize = size_of::<u32>();

/// A `fletcher32` checksum filter.
///
/// Appends the fletcher32 checksum of the input, computed over little endian 16-bit words, as 4 little endian
/// bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fletcher32Filter;

fn fletcher32(data: &[u8]) -> u32 {
    let mut sum1: u32 = 0;
    let mut sum2: u32 = 0;
    for word in data.chunks(2) {
        let value = match word {
            [lo, hi] => u32::from(u16::from_le_bytes([*lo, *hi])),
            [lo] => u32::from(*lo),
            _ => 0,
        };
        sum1 = (sum1 + value) % 65535;
        sum2 = (sum2 + sum1) % 65535;
    }
    (sum2 << 16) | sum1
}

impl BytesFilterTraits for Fletcher32Filter {
    fn name(&self) -> &'static str {
        "fletcher32"
    }

    fn encode<'a>(&self, decoded_value: Cow<'a, [u8]>) -> Result<Cow<'a, [u8]>, FilterError> {
        let checksum = fletcher32(&decoded_value);
        let mut encoded_value = decoded_value.into_owned();
        encoded_value.extend_from_slice(&checksum.to_le_bytes());
        Ok(Cow::Owned(encoded_value))
    }

    fn decode<'a>(&self, encoded_value: Cow<'a, [u8]>) -> Result<Cow<'a, [u8]>, FilterError> {
        let Some(data_len) = encoded_value.len().checked_sub(CHECKSUM_SIZE) else {
            return Err(FilterError::Other(
                "fletcher32 encoded value is shorter than the checksum".to_string(),
            ));
        };
        let mut stored = [0u8; CHECKSUM_SIZE];
        stored.copy_from_slice(&encoded_value[data_len..]);
        let stored = u32::from_le_bytes(stored);
        let computed = fletcher32(&encoded_value[..data_len]);
        if stored != computed {
            return Err(FilterError::ChecksumMismatch { stored, computed });
        }
        Ok(match encoded_value {
            Cow::Borrowed(value) => Cow::Borrowed(&value[..data_len]),
            Cow::Owned(mut value) => {
                value.truncate(data_len);
                Cow::Owned(value)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fletcher32_checksum() {
        assert_eq!(fletcher32(b"abcde"), 0xF04F_C729);
        assert_eq!(fletcher32(b"abcdef"), 0x5650_2D2A);
    }

    #[test]
    fn fletcher32_round_trip_and_corruption() {
        let data = b"abcdefgh".to_vec();
        let encoded = Fletcher32Filter
            .encode(Cow::Borrowed(&data))
            .unwrap()
            .into_owned();
        assert_eq!(encoded.len(), data.len() + 4);
        let decoded = Fletcher32Filter.decode(Cow::Borrowed(&encoded)).unwrap();
        assert_eq!(decoded.as_ref(), data.as_slice());

        let mut corrupted = encoded.clone();
        corrupted[0] ^= 0xff;
        assert!(matches!(
            Fletcher32Filter.decode(Cow::Owned(corrupted)),
            Err(FilterError::ChecksumMismatch { .. })
        ));
        assert!(Fletcher32Filter.decode(Cow::Borrowed(&[0u8, 1])).is_err());
    }
}
