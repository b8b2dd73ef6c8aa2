use crate::{ensure, Capability, Stream, StreamError, StreamResult};
use log::{debug, trace};
use std::fmt;
use std::io::{ErrorKind, Read, Write};

/// Largest transfer from the underlying reader in one call.
const CHUNK_SIZE: usize = 8192;

enum Channel {
    Input(Box<dyn Read + Send>),
    Output(Box<dyn Write + Send>),
}

/// A [`Stream`](../trait.Stream.html) over a one-directional I/O channel
/// such as a pipe, a socket half or the process standard streams.
///
/// A channel cannot seek: its position and length are both the number of
/// bytes transferred so far, and
/// [`seek()`](../trait.Stream.html#tymethod.seek) fails with
/// [`StreamError::Unsupported`]. An output channel cannot be resized
/// either and [`resize()`](../trait.Stream.html#tymethod.resize) returns
/// `Ok(false)`.
///
/// A read that is not exact returns the bytes the channel has ready in a
/// single transfer of at most 8 KiB. An exact read keeps reading until the requested
/// amount of bytes is reached. If the channel ends before, the bytes read
/// are lost and [`StreamError::ShortRead`] is returned.
pub struct ChannelStream {
    channel: Option<Channel>,
    input: bool,
    transferred: u64,
}

impl ChannelStream {
    /// A readable stream pulling bytes from `reader`.
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        ChannelStream {
            channel: Some(Channel::Input(Box::new(reader))),
            input: true,
            transferred: 0,
        }
    }

    /// A writable stream pushing bytes into `writer`.
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        ChannelStream {
            channel: Some(Channel::Output(Box::new(writer))),
            input: false,
            transferred: 0,
        }
    }

    /// The standard input of the process.
    pub fn stdin() -> Self {
        Self::from_reader(std::io::stdin())
    }

    /// The standard output of the process.
    pub fn stdout() -> Self {
        Self::from_writer(std::io::stdout())
    }

    /// The standard error of the process.
    pub fn stderr() -> Self {
        Self::from_writer(std::io::stderr())
    }
}

impl fmt::Debug for ChannelStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelStream")
            .field("input", &self.input)
            .field("open", &self.channel.is_some())
            .field("transferred", &self.transferred)
            .finish()
    }
}

impl Stream for ChannelStream {
    fn position(&self) -> u64 {
        self.transferred
    }

    fn length(&self) -> u64 {
        self.transferred
    }

    fn can_read(&self) -> bool {
        self.is_open() && self.input
    }

    fn can_write(&self) -> bool {
        self.is_open() && !self.input
    }

    fn can_seek(&self) -> bool {
        false
    }

    fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    fn seek(&mut self, _position: u64) -> StreamResult<bool> {
        ensure(&*self, Capability::Seek, "seek")?;
        Ok(false)
    }

    fn read(&mut self, length: usize, exact: bool) -> StreamResult<Vec<u8>> {
        ensure(&*self, Capability::Read, "read")?;
        let reader = match self.channel.as_mut() {
            Some(Channel::Input(reader)) => reader,
            _ => return Err(StreamError::unsupported("read")),
        };

        let mut buf = Vec::new();
        let mut chunk = [0u8; CHUNK_SIZE];
        while buf.len() < length {
            let want = (length - buf.len()).min(CHUNK_SIZE);
            match reader.read(&mut chunk[..want]) {
                Ok(0) => break,
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    if !exact {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        let filled = buf.len();

        self.transferred += filled as u64;
        trace!("ChannelStream read {} bytes.", filled);
        if exact && filled < length {
            return Err(StreamError::ShortRead {
                attempted: length,
                actual: filled,
            });
        }
        Ok(buf)
    }

    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        ensure(&*self, Capability::Write, "write")?;
        let writer = match self.channel.as_mut() {
            Some(Channel::Output(writer)) => writer,
            _ => return Err(StreamError::unsupported("write")),
        };
        writer.write_all(data)?;
        writer.flush()?;

        self.transferred += data.len() as u64;
        trace!("ChannelStream wrote {} bytes.", data.len());
        Ok(data.len())
    }

    fn resize(&mut self, _length: u64) -> StreamResult<bool> {
        ensure(&*self, Capability::Write, "resize")?;
        Ok(false)
    }

    fn close(&mut self) -> StreamResult<()> {
        if let Some(channel) = self.channel.take() {
            if let Channel::Output(mut writer) = channel {
                writer.flush()?;
            }
            debug!(
                "ChannelStream closed after {} bytes.",
                self.transferred
            );
        }
        Ok(())
    }
}
