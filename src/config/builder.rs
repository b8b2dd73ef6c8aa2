#[cfg(feature = "tempfile")]
use super::configs::TempFileStreamConfig;
use super::configs::{FileStreamConfig, MemoryStreamConfig};
use super::{deserialize, ConfigError, ConfigInstance};
use crate::{DynStream, SharedStream};
use log::debug;
use serde::{Deserialize, Serialize};

/// Configuration ids supported by [`ConfigBuilder`].
#[cfg(feature = "tempfile")]
static CONFIGS: [&str; 3] = [
    "MemoryStreamConfig",
    "FileStreamConfig",
    "TempFileStreamConfig",
];
#[cfg(not(feature = "tempfile"))]
static CONFIGS: [&str; 2] = ["MemoryStreamConfig", "FileStreamConfig"];

/// The `[range]` table of a configuration.
///
/// When present, the stream built is a
/// [`Substream`](../struct.Substream.html) over `[start, end)` of the
/// configured backend. `start` defaults to 0 and a missing `end` follows
/// the end of the backend.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RangeConfig {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

#[derive(Clone, Debug)]
enum GenericConfig {
    Memory(MemoryStreamConfig),
    File(FileStreamConfig),
    #[cfg(feature = "tempfile")]
    TempFile(TempFileStreamConfig),
}

/// Stream builder from a generic configuration.
///
/// This structure is the entry point to build a stream from a
/// configuration file/string. It is instantiated from a
/// [`toml`](../../toml/index.html) configuration string or file and consumed
/// to open a stream. The stream comes as a [`DynStream`](../type.DynStream.html),
/// i.e a [`std::boxed::Box`]`<dyn` [`Stream`](../trait.Stream.html)`>`.
///
/// In order to be valid, a configuration must be in a proper
/// [`toml`](../../toml/index.html) format where the root element is a
/// table. The table must contain an "id" key identifying the type of
/// backend to build. Valid backend types are enumerated in the
/// [`configs`](configs/index.html) module. If one of these conditions is
/// not satisfied, a [`ConfigError::ConfigFormatError`] is returned
/// when instantiating the [`ConfigBuilder`].
///
/// The table may also contain a [`range`](struct.RangeConfig.html) table,
/// in which case the built stream is a view over this range of the
/// backend. The range is checked against the backend when building the
/// stream.
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    config: GenericConfig,
    range: Option<RangeConfig>,
}

impl ConfigBuilder {
    pub fn from_string(s: &str) -> Result<Self, ConfigError> {
        ConfigInstance::from_string(s)
    }

    pub fn from_file<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<Self, ConfigError> {
        ConfigInstance::from_file(path)
    }

    /// The range of the backend the built stream is restricted to.
    pub fn range(&self) -> Option<&RangeConfig> {
        self.range.as_ref()
    }

    fn build_backend(config: GenericConfig) -> Result<DynStream, ConfigError> {
        match config {
            GenericConfig::Memory(c) => c.build(),
            GenericConfig::File(c) => c.build(),
            #[cfg(feature = "tempfile")]
            GenericConfig::TempFile(c) => c.build(),
        }
    }
}

impl ConfigInstance for ConfigBuilder {
    /// Check that the toml value is a table with a supported "id" field and
    /// a valid configuration for this id.
    fn from_toml(value: &toml::Value) -> Result<Self, ConfigError> {
        let table = match value {
            toml::Value::Table(t) => t,
            _ => {
                return Err(ConfigError::ConfigFormatError(String::from(
                    "Stream configuration must be a toml table.",
                )))
            }
        };

        let id = match table.get("id") {
            None => {
                return Err(ConfigError::ConfigFormatError(String::from(
                    "Configuration must have an 'id' field.",
                )))
            }
            Some(s) => match s.as_str() {
                Some(s) => s,
                None => {
                    return Err(ConfigError::ConfigFormatError(
                        String::from("Invalid id type, must be a string."),
                    ))
                }
            },
        };

        let range = match table.get("range") {
            None => None,
            Some(range) => Some(deserialize::<RangeConfig>("range", range)?),
        };

        let config = match id {
            "MemoryStreamConfig" => {
                GenericConfig::Memory(MemoryStreamConfig::from_toml(value)?)
            }
            "FileStreamConfig" => {
                GenericConfig::File(FileStreamConfig::from_toml(value)?)
            }
            #[cfg(feature = "tempfile")]
            "TempFileStreamConfig" => GenericConfig::TempFile(
                TempFileStreamConfig::from_toml(value)?,
            ),
            unknown => {
                return Err(ConfigError::ConfigFormatError(format!(
                    "Invalid stream configuration type: {}\nPossible values are: {:?}.",
                    unknown, CONFIGS
                )))
            }
        };

        Ok(ConfigBuilder { config, range })
    }

    /// Open the configured backend, then restrict it to the configured
    /// range if any.
    fn build(self) -> Result<DynStream, ConfigError> {
        let backend = Self::build_backend(self.config)?;
        match self.range {
            None => Ok(backend),
            Some(range) => {
                debug!("Building stream over range {:?}.", range);
                let shared = SharedStream::new(backend);
                let substream =
                    shared.substream(Some(range.start.unwrap_or(0)), range.end)?;
                Ok(Box::new(substream))
            }
        }
    }
}
