//! Seekable, randomly addressable byte streams over heterogeneous
//! backing stores, with zero-copy views on byte ranges.
//!
//! The [`Stream`] trait is the single contract shared by every stream of
//! this crate. It is implemented by backend streams owning a resource:
//! * [`MemoryStream`](streams/struct.MemoryStream.html) over a
//! contiguous buffer,
//! * [`FileStream`](streams/struct.FileStream.html) over a window of an
//! open file,
//! * [`ChannelStream`](streams/struct.ChannelStream.html) over a
//! one-directional, non-seekable I/O channel.
//!
//! A backend wrapped in a [`SharedStream`] can hand out [`Substream`]s:
//! views restricted to a byte range of the backend, which are themselves
//! streams and can hand out nested substreams.
//!
//! ```
//! use seekstream::{SharedStream, Stream};
//! use seekstream::streams::MemoryStream;
//!
//! let stream = SharedStream::new(MemoryStream::from(b"hello world".to_vec()));
//! let mut world = stream.substream(Some(6), Some(11)).unwrap();
//! assert_eq!(world.position(), 0);
//! assert_eq!(world.read(5, true).unwrap(), b"world".to_vec());
//! ```

/// Error types of stream operations.
mod error;
pub use error::{StreamError, StreamResult};

/// Derivation of capability flags.
mod capability;
pub use capability::{Capabilities, Capability};
pub(crate) use capability::{ensure, ensure_open};

/// Byte stream contract for a seekable, resizable stream of bytes.
///
/// A stream exposes a cursor (its [`position()`](#tymethod.position)) over
/// `length()` addressable bytes. At rest between two operations,
/// `0 <= position() <= length()` holds.
///
/// Every operation checks its preconditions in the same order:
/// 1. The stream must be open, otherwise the operation fails with
/// [`StreamError::NotOpen`].
/// 2. The stream must support the operation as reported by its
/// capability flags, otherwise the operation fails with
/// [`StreamError::Unsupported`].
/// 3. The operation arguments are checked against the stream bounds.
///
/// Out-of-bound seeks and resizes that a backend cannot honor are not
/// errors. They return `Ok(false)` and leave the stream untouched, such
/// that callers can probe a stream without handling errors.
///
/// Operations block the calling thread until the underlying medium
/// completes or fails. A stream instance has a single cursor: calls on the
/// same instance must be serialized, which `&mut self` enforces.
pub trait Stream {
    /// The current cursor, relative to the beginning of the stream.
    fn position(&self) -> u64;

    /// The number of addressable bytes in the stream.
    fn length(&self) -> u64;

    /// Whether [`read()`](#tymethod.read) is allowed.
    fn can_read(&self) -> bool;

    /// Whether [`write()`](#tymethod.write) and
    /// [`resize()`](#tymethod.resize) are allowed.
    fn can_write(&self) -> bool;

    /// Whether [`seek()`](#tymethod.seek) is allowed.
    fn can_seek(&self) -> bool;

    /// Whether the stream has not been closed yet.
    fn is_open(&self) -> bool;

    /// Move the cursor to `position`.
    ///
    /// Returns `Ok(false)` without moving the cursor if `position` is past
    /// [`length()`](#tymethod.length). Seeking exactly at `length()` is
    /// valid.
    fn seek(&mut self, position: u64) -> StreamResult<bool>;

    /// Read up to `length` bytes at the cursor and advance the cursor by
    /// the number of bytes read.
    ///
    /// If `exact` is set and fewer than `length` bytes can be produced,
    /// the call fails with [`StreamError::ShortRead`]. Otherwise whatever
    /// is available is returned, possibly nothing at the end of the
    /// stream.
    fn read(&mut self, length: usize, exact: bool) -> StreamResult<Vec<u8>>;

    /// Write `data` at the cursor and advance the cursor by the number of
    /// bytes written, which is returned.
    ///
    /// Writing past [`length()`](#tymethod.length) grows the stream when
    /// the stream can grow.
    fn write(&mut self, data: &[u8]) -> StreamResult<usize>;

    /// Truncate or extend the stream to `length` bytes.
    ///
    /// Returns `Ok(false)` without modifying the stream if it cannot have
    /// this size. The cursor is clamped to the new length.
    fn resize(&mut self, length: u64) -> StreamResult<bool>;

    /// Release the stream resources.
    ///
    /// Closing is irreversible and propagates to the substreams built on
    /// this stream. Closing an already closed stream does nothing.
    fn close(&mut self) -> StreamResult<()>;

    /// Number of bytes between the cursor and the end of the stream.
    fn remaining(&self) -> u64 {
        self.length().saturating_sub(self.position())
    }

    /// Capability flags of the stream, at the time of the call.
    fn capabilities(&self) -> Capabilities {
        Capabilities::of(self)
    }

    /// Move the cursor by `offset` bytes.
    ///
    /// Returns `Ok(false)` without moving the cursor if the target
    /// position is before the beginning or past the end of the stream.
    fn seek_relative(&mut self, offset: i64) -> StreamResult<bool> {
        ensure(&*self, Capability::Seek, "seek")?;
        let target = if offset >= 0 {
            self.position().checked_add(offset as u64)
        } else {
            self.position().checked_sub(offset.unsigned_abs())
        };
        match target {
            Some(position) => self.seek(position),
            None => Ok(false),
        }
    }

    /// Seek at `position` then [`read()`](#tymethod.read).
    ///
    /// Seeking out of bounds fails with [`StreamError::InvalidRange`].
    fn read_from(
        &mut self,
        position: u64,
        length: usize,
        exact: bool,
    ) -> StreamResult<Vec<u8>> {
        ensure(&*self, Capability::Read, "read")?;
        if !self.seek(position)? {
            return Err(StreamError::invalid_range(
                position,
                position.saturating_add(length as u64),
                self.length(),
            ));
        }
        self.read(length, exact)
    }

    /// Seek at `position` then [`write()`](#tymethod.write).
    ///
    /// Seeking out of bounds fails with [`StreamError::InvalidRange`].
    fn write_at(&mut self, position: u64, data: &[u8]) -> StreamResult<usize> {
        ensure(&*self, Capability::Write, "write")?;
        if !self.seek(position)? {
            return Err(StreamError::invalid_range(
                position,
                position.saturating_add(data.len() as u64),
                self.length(),
            ));
        }
        self.write(data)
    }

    /// [`write()`](#tymethod.write) `data`, failing with
    /// [`StreamError::ShortWrite`] if not all of it could be written.
    fn write_exact(&mut self, data: &[u8]) -> StreamResult<()> {
        let written = self.write(data)?;
        if written < data.len() {
            Err(StreamError::ShortWrite {
                attempted: data.len(),
                actual: written,
            })
        } else {
            Ok(())
        }
    }
}

impl<S: Stream + ?Sized> Stream for Box<S> {
    fn position(&self) -> u64 {
        (**self).position()
    }

    fn length(&self) -> u64 {
        (**self).length()
    }

    fn can_read(&self) -> bool {
        (**self).can_read()
    }

    fn can_write(&self) -> bool {
        (**self).can_write()
    }

    fn can_seek(&self) -> bool {
        (**self).can_seek()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn seek(&mut self, position: u64) -> StreamResult<bool> {
        (**self).seek(position)
    }

    fn read(&mut self, length: usize, exact: bool) -> StreamResult<Vec<u8>> {
        (**self).read(length, exact)
    }

    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        (**self).write(data)
    }

    fn resize(&mut self, length: u64) -> StreamResult<bool> {
        (**self).resize(length)
    }

    fn close(&mut self) -> StreamResult<()> {
        (**self).close()
    }
}

/// Object safe stream, e.g. as built from a
/// [configuration](config/index.html).
pub type DynStream = Box<dyn Stream>;

/// Shared closed state between a stream and the views built on it.
mod lifecycle;
pub use lifecycle::Lifecycle;

/// Reference counted handle on a backend stream.
mod shared;
pub use shared::SharedStream;

/// Range restricted view over a stream.
mod substream;
pub use substream::Substream;

/// Backend streams owning a resource.
///
/// This module also provides the [`StreamFactory`](streams/trait.StreamFactory.html)
/// facility to spawn new backends.
pub mod streams;

/// Instantiate streams from a configuration file.
#[cfg(feature = "config")]
pub mod config;

#[cfg(test)]
mod tests;
