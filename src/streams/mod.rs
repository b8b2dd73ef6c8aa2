use crate::{Stream, StreamResult};

/// Facility to spawn streams.
pub trait StreamFactory {
    type Stream: Stream;
    fn create(&mut self) -> StreamResult<Self::Stream>;
}

mod memory_stream;
pub use memory_stream::{MemoryStream, MemoryStreamFactory};
mod file_stream;
#[cfg(feature = "tempfile")]
pub use file_stream::TempFileStreamFactory;
pub use file_stream::{FileStream, OpenMode};
mod channel_stream;
pub use channel_stream::ChannelStream;
