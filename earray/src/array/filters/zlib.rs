use std::borrow::Cow;
use std::io::{Cursor, Read};

use super::{BytesFilterTraits, FilterError};

/// A `zlib` compression filter.
#[derive(Clone, Debug)]
pub struct ZlibFilter {
    compression: flate2::Compression,
}

impl ZlibFilter {
    /// Create a new `zlib` filter with compression `level` (`0` to `9`).
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            compression: flate2::Compression::new(level.min(9)),
        }
    }
}

impl BytesFilterTraits for ZlibFilter {
    fn name(&self) -> &'static str {
        "zlib"
    }

    fn encode<'a>(&self, decoded_value: Cow<'a, [u8]>) -> Result<Cow<'a, [u8]>, FilterError> {
        let mut encoder =
            flate2::read::ZlibEncoder::new(Cursor::new(decoded_value), self.compression);
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(Cow::Owned(out))
    }

    fn decode<'a>(&self, encoded_value: Cow<'a, [u8]>) -> Result<Cow<'a, [u8]>, FilterError> {
        let mut decoder = flate2::read::ZlibDecoder::new(Cursor::new(encoded_value));
        let mut out: Vec<u8> = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(Cow::Owned(out))
    }
}
