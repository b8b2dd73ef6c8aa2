//! Module to instantiate a stream from a configuration file.
//!
//! Configuration files/strings describe a backend stream, and optionally
//! the range of it to expose, in the [`toml`](https://toml.io/en/) format.
//! The [`ConfigBuilder`] structure is the entry point to create a stream
//! instance from a configuration string or file:
//! ```
//! use seekstream::Stream;
//! use seekstream::config::{ConfigBuilder, ConfigInstance};
//!
//! let config_str = "
//! id='MemoryStreamConfig'
//! capacity=16
//! fixed=true
//! [range]
//! start=4
//! end=8
//! ";
//! let mut stream = ConfigBuilder::from_string(config_str)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! assert_eq!(stream.length(), 4);
//! assert_eq!(stream.write(b"abcdef").unwrap(), 4);
//! ```
//!
//! See the [`configs`](configs/index.html) module for the collection of
//! backend configuration formats.

use crate::DynStream;
use std::io::Read;

/// Trait of configuration objects that can be parsed from a toml
/// configuration and built into a stream.
///
/// Backend configurations are identified by the `id` field of their
/// table. The [`ConfigBuilder`] checks this field before handing the table
/// to the matching implementer of
/// [`from_toml()`](trait.ConfigInstance.html#tymethod.from_toml).
pub trait ConfigInstance {
    /// Parse this configuration from a toml value.
    fn from_toml(value: &toml::Value) -> Result<Self, ConfigError>
    where
        Self: Sized;

    /// Open the stream described by this configuration.
    fn build(self) -> Result<DynStream, ConfigError>;

    /// Parse this configuration from a toml string.
    fn from_string(s: &str) -> Result<Self, ConfigError>
    where
        Self: Sized,
    {
        let value: toml::Value = toml::from_str(s)?;
        Self::from_toml(&value)
    }

    /// Parse this configuration from a toml file.
    fn from_file<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<Self, ConfigError>
    where
        Self: Sized,
    {
        let mut file = std::fs::File::open(&path)?;
        let mut s = String::new();
        file.read_to_string(&mut s)?;
        Self::from_string(s.as_str())
    }
}

/// Deserialize a configuration struct from a toml value, reporting errors
/// as [`ConfigError::ConfigFormatError`].
pub(crate) fn deserialize<C: serde::de::DeserializeOwned>(
    id: &str,
    value: &toml::Value,
) -> Result<C, ConfigError> {
    value.clone().try_into().map_err(|e| {
        ConfigError::ConfigFormatError(format!(
            "Invalid {}: {}\n{:?}",
            id, value, e
        ))
    })
}

mod builder;
pub use builder::{ConfigBuilder, RangeConfig};
mod error;
pub use error::ConfigError;
mod file;
mod memory;

/// The collection of available configurations.
pub mod configs {
    #[cfg(feature = "tempfile")]
    pub use super::file::TempFileStreamConfig;
    pub use super::file::FileStreamConfig;
    pub use super::memory::MemoryStreamConfig;
}
