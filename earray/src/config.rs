//! `earray` global configuration options.
//!
//! See [`Config`] for the list of options.

use std::sync::OnceLock;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::array::BufferSizePolicy;

/// Global configuration options for the `earray` crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// Changes only affect arrays created or opened afterwards: the chunk geometry of an array is computed once when it
/// is created or opened.
///
/// ## Buffer Size Policy
/// > default: [`BufferSizePolicy::default()`] (a 2000 byte multiplier)
///
/// Maps the expected size of an array in bytes to the byte budget of one in-memory buffer.
///
/// ## Chunk Times
/// > default: `5`
///
/// The number of buffer-sized chunks that fit in one buffer budget.
/// Larger values produce more, smaller chunks.
///
/// ## Expected Rows
/// > default: `1000`
///
/// The expected number of rows used when an array is created without an explicit estimate.
#[derive(Debug, Clone)]
pub struct Config {
    buffer_size_policy: BufferSizePolicy,
    chunk_times: u64,
    expected_rows: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_size_policy: BufferSizePolicy::default(),
            chunk_times: 5,
            expected_rows: 1000,
        }
    }
}

impl Config {
    /// Get the [buffer size policy](#buffer-size-policy) configuration.
    #[must_use]
    pub fn buffer_size_policy(&self) -> BufferSizePolicy {
        self.buffer_size_policy
    }

    /// Set the [buffer size policy](#buffer-size-policy) configuration.
    pub fn set_buffer_size_policy(&mut self, buffer_size_policy: BufferSizePolicy) -> &mut Self {
        self.buffer_size_policy = buffer_size_policy;
        self
    }

    /// Get the [chunk times](#chunk-times) configuration.
    #[must_use]
    pub fn chunk_times(&self) -> u64 {
        self.chunk_times
    }

    /// Set the [chunk times](#chunk-times) configuration.
    ///
    /// A value of zero is treated as one.
    pub fn set_chunk_times(&mut self, chunk_times: u64) -> &mut Self {
        self.chunk_times = chunk_times.max(1);
        self
    }

    /// Get the [expected rows](#expected-rows) configuration.
    #[must_use]
    pub fn expected_rows(&self) -> u64 {
        self.expected_rows
    }

    /// Set the [expected rows](#expected-rows) configuration.
    pub fn set_expected_rows(&mut self, expected_rows: u64) -> &mut Self {
        self.expected_rows = expected_rows;
        self
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global `earray` configuration.
#[must_use]
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default())).read()
}

/// Returns a mutable reference to the global `earray` configuration.
///
/// Do not hold the returned guard while creating or opening an array, that would deadlock.
#[must_use]
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default())).write()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn config_chunk_times() {
        assert_eq!(global_config().chunk_times(), 5);
        global_config_mut().set_chunk_times(0);
        assert_eq!(global_config().chunk_times(), 1);
        global_config_mut().set_chunk_times(5);
        assert_eq!(global_config().chunk_times(), 5);
    }

    #[test]
    #[serial_test::serial]
    fn config_expected_rows() {
        assert_eq!(global_config().expected_rows(), 1000);
        global_config_mut().set_expected_rows(10);
        assert_eq!(global_config().expected_rows(), 10);
        global_config_mut().set_expected_rows(1000);
    }
}
