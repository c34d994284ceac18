//! Chunk filters.
//!
//! Each chunk of an extensible array passes through a [`FilterPipeline`] before it is stored:
//! 1. `shuffle`: transposes the bytes of the elements of a chunk (only if the chunk is compressed),
//! 2. compression: `zlib` or `bzip2` (disabled with a compression level of `0`),
//! 3. `fletcher32`: appends a checksum of the encoded chunk, verified on decode.

mod fletcher32;
mod shuffle;

#[cfg(feature = "bz2")]
mod bz2;
#[cfg(feature = "zlib")]
mod zlib;

use std::{borrow::Cow, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fletcher32::Fletcher32Filter;
pub use shuffle::ShuffleFilter;

#[cfg(feature = "bz2")]
pub use bz2::Bz2Filter;
#[cfg(feature = "zlib")]
pub use zlib::ZlibFilter;

/// A compression library.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compressor {
    /// The `zlib` compressor.
    #[default]
    Zlib,
    /// The `bzip2` compressor.
    Bzip2,
}

/// The filters applied to the chunks of an extensible array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Filters {
    complevel: u32,
    complib: Compressor,
    shuffle: bool,
    fletcher32: bool,
}

impl Default for Filters {
    /// No compression, shuffle enabled (it only applies to compressed chunks), no checksum.
    fn default() -> Self {
        Self {
            complevel: 0,
            complib: Compressor::default(),
            shuffle: true,
            fletcher32: false,
        }
    }
}

impl Filters {
    /// Create filters compressing with `complib` at `complevel` (`0` to `9`, `0` disables compression).
    #[must_use]
    pub fn new(complevel: u32, complib: Compressor) -> Self {
        Self {
            complevel,
            complib,
            ..Self::default()
        }
    }

    /// Enable or disable the shuffle filter.
    #[must_use]
    pub const fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Enable or disable the fletcher32 checksum.
    #[must_use]
    pub const fn with_fletcher32(mut self, fletcher32: bool) -> Self {
        self.fletcher32 = fletcher32;
        self
    }

    /// The compression level.
    #[must_use]
    pub const fn complevel(&self) -> u32 {
        self.complevel
    }

    /// The compression library.
    #[must_use]
    pub const fn complib(&self) -> Compressor {
        self.complib
    }

    /// Returns true if the shuffle filter is enabled.
    #[must_use]
    pub const fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Returns true if the fletcher32 checksum is enabled.
    #[must_use]
    pub const fn fletcher32(&self) -> bool {
        self.fletcher32
    }

    /// Create the filter pipeline for chunks with elements of `element_size` bytes.
    ///
    /// # Errors
    /// Returns a [`FilterError`] if the compression level is invalid or the compressor is not enabled.
    pub fn pipeline(&self, element_size: usize) -> Result<FilterPipeline, FilterError> {
        if self.complevel > 9 {
            return Err(FilterError::InvalidLevel(self.complib, self.complevel));
        }
        let mut filters: Vec<Arc<dyn BytesFilterTraits>> = Vec::new();
        if self.complevel > 0 {
            if self.shuffle && element_size > 1 {
                filters.push(Arc::new(ShuffleFilter::new(element_size)));
            }
            filters.push(compressor(self.complib, self.complevel)?);
        }
        if self.fletcher32 {
            filters.push(Arc::new(Fletcher32Filter));
        }
        Ok(FilterPipeline { filters })
    }
}

#[allow(unused_variables)]
fn compressor(complib: Compressor, level: u32) -> Result<Arc<dyn BytesFilterTraits>, FilterError> {
    match complib {
        #[cfg(feature = "zlib")]
        Compressor::Zlib => Ok(Arc::new(ZlibFilter::new(level))),
        #[cfg(feature = "bz2")]
        Compressor::Bzip2 => Ok(Arc::new(Bz2Filter::new(level))),
        #[allow(unreachable_patterns)]
        _ => Err(FilterError::Unsupported(format!(
            "the {complib:?} compressor is not enabled"
        ))),
    }
}

/// A filter error.
#[derive(Clone, Debug, Error)]
pub enum FilterError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] Arc<std::io::Error>),
    /// An invalid compression level.
    #[error("invalid {0:?} compression level {1}, expected 0 to 9")]
    InvalidLevel(Compressor, u32),
    /// The filter is not supported.
    #[error("unsupported filter: {0}")]
    Unsupported(String),
    /// A checksum mismatch.
    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// The stored checksum.
        stored: u32,
        /// The computed checksum.
        computed: u32,
    },
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for FilterError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(Arc::new(err))
    }
}

/// Traits for a filter transforming bytes to bytes.
pub trait BytesFilterTraits: std::fmt::Debug + Send + Sync {
    /// The name of the filter.
    fn name(&self) -> &'static str;

    /// Encode `decoded_value`.
    ///
    /// # Errors
    /// Returns a [`FilterError`] if encoding fails.
    fn encode<'a>(&self, decoded_value: Cow<'a, [u8]>) -> Result<Cow<'a, [u8]>, FilterError>;

    /// Decode `encoded_value`.
    ///
    /// # Errors
    /// Returns a [`FilterError`] if decoding fails.
    fn decode<'a>(&self, encoded_value: Cow<'a, [u8]>) -> Result<Cow<'a, [u8]>, FilterError>;
}

/// An ordered sequence of filters.
#[derive(Clone, Debug, Default)]
pub struct FilterPipeline {
    filters: Vec<Arc<dyn BytesFilterTraits>>,
}

impl FilterPipeline {
    /// The names of the filters in encoding order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|filter| filter.name()).collect()
    }

    /// Encode `decoded_value` through every filter in order.
    ///
    /// # Errors
    /// Returns a [`FilterError`] if a filter fails.
    pub fn encode<'a>(&self, decoded_value: Cow<'a, [u8]>) -> Result<Cow<'a, [u8]>, FilterError> {
        self.filters
            .iter()
            .try_fold(decoded_value, |value, filter| filter.encode(value))
    }

    /// Decode `encoded_value` through every filter in reverse order.
    ///
    /// # Errors
    /// Returns a [`FilterError`] if a filter fails.
    pub fn decode<'a>(&self, encoded_value: Cow<'a, [u8]>) -> Result<Cow<'a, [u8]>, FilterError> {
        self.filters
            .iter()
            .rev()
            .try_fold(encoded_value, |value, filter| filter.decode(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> Vec<u8> {
        (0..1024u32)
            .flat_map(|i| (i % 7).to_le_bytes())
            .collect::<Vec<u8>>()
    }

    #[test]
    #[cfg(feature = "zlib")]
    fn filters_pipeline_names() {
        assert!(Filters::default().pipeline(8).unwrap().names().is_empty());
        assert_eq!(
            Filters::new(5, Compressor::Zlib)
                .with_fletcher32(true)
                .pipeline(8)
                .unwrap()
                .names(),
            vec!["shuffle", "zlib", "fletcher32"]
        );
        assert_eq!(
            Filters::new(5, Compressor::Zlib)
                .with_shuffle(false)
                .pipeline(8)
                .unwrap()
                .names(),
            vec!["zlib"]
        );
        assert_eq!(
            Filters::new(0, Compressor::Zlib)
                .with_fletcher32(true)
                .pipeline(8)
                .unwrap()
                .names(),
            vec!["fletcher32"]
        );
        assert!(matches!(
            Filters::new(10, Compressor::Zlib).pipeline(8),
            Err(FilterError::InvalidLevel(Compressor::Zlib, 10))
        ));
    }

    #[test]
    #[cfg(all(feature = "zlib", feature = "bz2"))]
    fn filters_pipeline_round_trip() {
        let data = data();
        for complib in [Compressor::Zlib, Compressor::Bzip2] {
            let pipeline = Filters::new(9, complib)
                .with_fletcher32(true)
                .pipeline(4)
                .unwrap();
            let encoded = pipeline.encode(Cow::Borrowed(&data)).unwrap();
            assert!(encoded.len() < data.len());
            let decoded = pipeline.decode(Cow::Owned(encoded.into_owned())).unwrap();
            assert_eq!(decoded.as_ref(), data.as_slice());
        }
    }

    #[test]
    fn filters_serde() {
        let filters = Filters::new(3, Compressor::Bzip2).with_fletcher32(true);
        let json = serde_json::to_string(&filters).unwrap();
        assert_eq!(
            json,
            r#"{"complevel":3,"complib":"bzip2","shuffle":true,"fletcher32":true}"#
        );
        assert_eq!(serde_json::from_str::<Filters>(&json).unwrap(), filters);
    }
}
