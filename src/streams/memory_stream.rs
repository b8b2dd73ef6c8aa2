use crate::streams::StreamFactory;
use crate::{ensure, Capability, Stream, StreamError, StreamResult};
use log::{debug, warn};

/// An implementation of a [`Stream`](../trait.Stream.html) in a `Vec<u8>`.
///
/// By default the buffer grows when written past its end. It can be
/// restricted to:
/// * a [fixed capacity](struct.MemoryStream.html#method.fixed_capacity)
/// where writes past the end fail after filling the buffer and resizing
/// to another size is refused,
/// * [read-only](struct.MemoryStream.html#method.read_only) access.
///
/// ```
/// use seekstream::Stream;
/// use seekstream::streams::MemoryStream;
///
/// let mut stream = MemoryStream::from(b"hello".to_vec()).fixed_capacity();
/// assert_eq!(stream.write(b"adios").unwrap(), 5);
/// assert!(stream.seek(2).unwrap());
/// assert!(stream.write(b"wwww").is_err());
/// assert_eq!(stream.contents(), b"adwww");
/// ```
#[derive(Debug)]
pub struct MemoryStream {
    buffer: Vec<u8>,
    position: usize,
    fixed: bool,
    read_only: bool,
    open: bool,
}

impl MemoryStream {
    /// An empty, growable, read-write stream.
    pub fn new() -> Self {
        Self::from(Vec::new())
    }

    /// A growable stream of `length` zeroed bytes.
    pub fn zeroed(length: usize) -> Self {
        Self::from(vec![0u8; length])
    }

    /// Forbid the stream to change size.
    pub fn fixed_capacity(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// Forbid writes and resizes.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Whether the stream is restricted to its current size.
    pub fn is_fixed_capacity(&self) -> bool {
        self.fixed
    }

    /// The bytes of the stream. Empty once the stream is closed.
    pub fn contents(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Consume the stream into its bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for MemoryStream {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<u8>> for MemoryStream {
    /// A growable, read-write stream over `buffer`, positioned at its
    /// beginning.
    fn from(buffer: Vec<u8>) -> Self {
        MemoryStream {
            buffer,
            position: 0usize,
            fixed: false,
            read_only: false,
            open: true,
        }
    }
}

impl Stream for MemoryStream {
    fn position(&self) -> u64 {
        self.position as u64
    }

    fn length(&self) -> u64 {
        self.buffer.len() as u64
    }

    fn can_read(&self) -> bool {
        self.open
    }

    fn can_write(&self) -> bool {
        self.open && !self.read_only
    }

    fn can_seek(&self) -> bool {
        self.open
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn seek(&mut self, position: u64) -> StreamResult<bool> {
        ensure(&*self, Capability::Seek, "seek")?;
        if position > self.length() {
            return Ok(false);
        }
        self.position = position as usize;
        Ok(true)
    }

    fn read(&mut self, length: usize, exact: bool) -> StreamResult<Vec<u8>> {
        ensure(&*self, Capability::Read, "read")?;
        let available = self.buffer.len() - self.position;
        if exact && available < length {
            return Err(StreamError::ShortRead {
                attempted: length,
                actual: available,
            });
        }

        let len = length.min(available);
        let range = self.position..(self.position + len);
        let data = self.buffer[range].to_vec();
        self.position += len;
        Ok(data)
    }

    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        ensure(&*self, Capability::Write, "write")?;
        let end = self.position + data.len();

        if end > self.buffer.len() {
            if self.fixed {
                let len = self.buffer.len() - self.position;
                self.buffer[self.position..].copy_from_slice(&data[..len]);
                self.position += len;
                warn!(
                    "Write of {} bytes overflows fixed capacity {}.",
                    data.len(),
                    self.buffer.len()
                );
                return Err(StreamError::ShortWrite {
                    attempted: data.len(),
                    actual: len,
                });
            }
            self.buffer.resize(end, 0u8);
        }

        self.buffer[self.position..end].copy_from_slice(data);
        self.position = end;
        Ok(data.len())
    }

    fn resize(&mut self, length: u64) -> StreamResult<bool> {
        ensure(&*self, Capability::Write, "resize")?;
        let size = match usize::try_from(length) {
            Ok(size) => size,
            Err(_) => return Ok(false),
        };
        if self.fixed && size != self.buffer.len() {
            return Ok(false);
        }
        self.buffer.resize(size, 0u8);
        self.position = self.position.min(size);
        debug!("MemoryStream resized to {} bytes.", size);
        Ok(true)
    }

    fn close(&mut self) -> StreamResult<()> {
        if self.open {
            self.open = false;
            self.position = 0;
            self.buffer = Vec::new();
            debug!("MemoryStream closed.");
        }
        Ok(())
    }
}

/// A Factory yielding empty [`MemoryStream`](struct.MemoryStream.html)
/// streams.
#[derive(Clone, Debug, Default)]
pub struct MemoryStreamFactory {}

impl StreamFactory for MemoryStreamFactory {
    type Stream = MemoryStream;
    fn create(&mut self) -> StreamResult<MemoryStream> {
        Ok(MemoryStream::new())
    }
}
