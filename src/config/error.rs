use crate::StreamError;
use thiserror::Error;

/// Errors raised while reading a configuration or building a stream from
/// it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration is not valid toml.
    #[error("invalid toml: {0}")]
    TomlFormatError(#[from] toml::de::Error),
    /// The configuration is valid toml but does not describe a stream.
    #[error("invalid configuration: {0}")]
    ConfigFormatError(String),
    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    IOError(#[from] std::io::Error),
    /// The configured stream could not be opened.
    #[error("cannot build stream: {0}")]
    StreamError(#[from] StreamError),
}
