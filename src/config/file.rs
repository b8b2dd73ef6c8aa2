use super::{deserialize, ConfigError, ConfigInstance};
#[cfg(feature = "tempfile")]
use crate::streams::{StreamFactory, TempFileStreamFactory};
use crate::streams::{FileStream, OpenMode};
use crate::DynStream;
use serde::{Deserialize, Serialize};

fn default_mode() -> String {
    String::from("r")
}

/// Configuration format for [`FileStream`](../../streams/struct.FileStream.html)
/// streams.
///
/// This configuration format is composed of:
/// - `id = "FileStreamConfig"`,
/// - `path = <string>`: the path of the file to open,
/// - `mode = "r" | "w" | "a" | "r+"`: the
/// [open mode](../../streams/enum.OpenMode.html) (default "r"),
/// - `start = <int>` and `end = <int>`: the optional window of the file to
/// open. The window defaults to the whole file.
///
/// ```
/// use seekstream::config::{ConfigInstance, configs::FileStreamConfig};
///
/// let config_str = "
/// id='FileStreamConfig'
/// path='/tmp/data.bin'
/// mode='r+'
/// start=128
/// ";
/// let config = FileStreamConfig::from_string(config_str).unwrap();
/// ```
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct FileStreamConfig {
    #[allow(dead_code)]
    id: String,
    path: String,
    #[serde(default = "default_mode")]
    mode: String,
    start: Option<u64>,
    end: Option<u64>,
}

impl FileStreamConfig {
    pub const ID: &'static str = "FileStreamConfig";
}

impl ConfigInstance for FileStreamConfig {
    fn from_toml(value: &toml::Value) -> Result<Self, ConfigError> {
        let config: Self = deserialize(Self::ID, value)?;
        if let Err(e) = config.mode.parse::<OpenMode>() {
            return Err(ConfigError::ConfigFormatError(format!(
                "Invalid {}: {}",
                Self::ID,
                e
            )));
        }
        Ok(config)
    }

    fn build(self) -> Result<DynStream, ConfigError> {
        let mode: OpenMode = self.mode.parse()?;
        let stream = match (self.start, self.end) {
            (None, None) => FileStream::open(&self.path, mode)?,
            (start, end) => {
                let end = match end {
                    Some(end) => end,
                    None => std::fs::metadata(&self.path)?.len(),
                };
                FileStream::open_range(
                    &self.path,
                    mode,
                    start.unwrap_or(0),
                    end,
                )?
            }
        };
        Ok(Box::new(stream))
    }
}

/// Configuration format for read-write
/// [`FileStream`](../../streams/struct.FileStream.html) streams over a
/// temporary file.
///
/// This configuration format has a single field: `id =
/// "TempFileStreamConfig"`. The file is deleted when the stream is closed
/// or dropped.
#[cfg(feature = "tempfile")]
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct TempFileStreamConfig {
    #[allow(dead_code)]
    id: String,
}

#[cfg(feature = "tempfile")]
impl TempFileStreamConfig {
    pub const ID: &'static str = "TempFileStreamConfig";
}

#[cfg(feature = "tempfile")]
impl ConfigInstance for TempFileStreamConfig {
    fn from_toml(value: &toml::Value) -> Result<Self, ConfigError> {
        deserialize(Self::ID, value)
    }

    fn build(self) -> Result<DynStream, ConfigError> {
        Ok(Box::new(TempFileStreamFactory {}.create()?))
    }
}
