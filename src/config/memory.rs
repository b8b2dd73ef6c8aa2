use super::{deserialize, ConfigError, ConfigInstance};
use crate::streams::MemoryStream;
use crate::DynStream;
use serde::{Deserialize, Serialize};

/// Configuration format for [`MemoryStream`](../../streams/struct.MemoryStream.html)
/// streams.
///
/// This configuration format is composed of an `id` field where the `id`
/// value must be "MemoryStreamConfig", and optional fields:
/// - `capacity = <int>`: the initial length of the stream, filled with
/// zeros (default 0),
/// - `fixed = <bool>`: whether the stream keeps this length forever
/// (default false),
/// - `read_only = <bool>`: whether writes are forbidden (default false).
///
/// ```
/// use seekstream::Stream;
/// use seekstream::config::{ConfigInstance, configs::MemoryStreamConfig};
///
/// let config_str = "
/// id='MemoryStreamConfig'
/// capacity=10
/// read_only=true
/// ";
/// let stream = MemoryStreamConfig::from_string(config_str)
///     .unwrap()
///     .build()
///     .unwrap();
/// assert_eq!(stream.length(), 10);
/// assert!(!stream.can_write());
/// ```
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct MemoryStreamConfig {
    #[allow(dead_code)]
    id: String,
    #[serde(default)]
    capacity: usize,
    #[serde(default)]
    fixed: bool,
    #[serde(default)]
    read_only: bool,
}

impl MemoryStreamConfig {
    pub const ID: &'static str = "MemoryStreamConfig";
}

impl ConfigInstance for MemoryStreamConfig {
    fn from_toml(value: &toml::Value) -> Result<Self, ConfigError> {
        deserialize(Self::ID, value)
    }

    fn build(self) -> Result<DynStream, ConfigError> {
        let mut stream = MemoryStream::zeroed(self.capacity);
        if self.fixed {
            stream = stream.fixed_capacity();
        }
        if self.read_only {
            stream = stream.read_only();
        }
        Ok(Box::new(stream))
    }
}
