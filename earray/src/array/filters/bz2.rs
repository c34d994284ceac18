use std::borrow::Cow;
use std::io::{Cursor, Read};

use super::{BytesFilterTraits, FilterError};

/// A `bzip2` compression filter.
#[derive(Clone, Debug)]
pub struct Bz2Filter {
    compression: bzip2::Compression,
}

impl Bz2Filter {
    /// Create a new `bzip2` filter with compression `level` (`1` to `9`).
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            compression: bzip2::Compression::new(level.clamp(1, 9)),
        }
    }
}

impl BytesFilterTraits for Bz2Filter {
    fn name(&self) -> &'static str {
        "bzip2"
    }

    fn encode<'a>(&self, decoded_value: Cow<'a, [u8]>) -> Result<Cow<'a, [u8]>, FilterError> {
        let mut encoder = bzip2::read::BzEncoder::new(Cursor::new(decoded_value), self.compression);
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(Cow::Owned(out))
    }

    fn decode<'a>(&self, encoded_value: Cow<'a, [u8]>) -> Result<Cow<'a, [u8]>, FilterError> {
        let mut decoder = bzip2::read::BzDecoder::new(Cursor::new(encoded_value));
        let mut out: Vec<u8> = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(Cow::Owned(out))
    }
}
