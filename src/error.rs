use thiserror::Error;

/// Hard failures of [`Stream`](trait.Stream.html) operations.
///
/// Recoverable outcomes such as seeking out of bounds or a resize the
/// backend cannot honor are not errors: they are reported as `Ok(false)`
/// by [`seek()`](trait.Stream.html#tymethod.seek) and
/// [`resize()`](trait.Stream.html#tymethod.resize).
#[derive(Debug, Error)]
pub enum StreamError {
    /// The stream, or the source it is a view of, has been closed.
    #[error("stream is not open")]
    NotOpen,
    /// The capability flags of the stream do not allow the operation.
    #[error("operation `{operation}` is not supported by this stream")]
    Unsupported { operation: &'static str },
    /// An exact read could not produce the requested amount of bytes.
    #[error("short read: attempted {attempted} bytes, got {actual}")]
    ShortRead { attempted: usize, actual: usize },
    /// An exact write could not store the requested amount of bytes.
    #[error("short write: attempted {attempted} bytes, wrote {actual}")]
    ShortWrite { attempted: usize, actual: usize },
    /// A range does not fit in a stream of `length` bytes.
    #[error("range [{start}, {end}) is invalid for a stream of length {length}")]
    InvalidRange { start: u64, end: u64, length: u64 },
    /// Error from the underlying medium.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type of [`Stream`](trait.Stream.html) operations.
pub type StreamResult<T> = Result<T, StreamError>;

impl StreamError {
    pub(crate) fn unsupported(operation: &'static str) -> Self {
        StreamError::Unsupported { operation }
    }

    pub(crate) fn invalid_range(start: u64, end: u64, length: u64) -> Self {
        StreamError::InvalidRange { start, end, length }
    }
}
