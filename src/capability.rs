use crate::{Stream, StreamError, StreamResult};
use std::fmt;

/// An operation class a [`Stream`](trait.Stream.html) may or may not
/// support.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Read,
    Write,
    Seek,
}

impl Capability {
    /// Whether `stream` currently supports this capability.
    pub fn of<S: Stream + ?Sized>(self, stream: &S) -> bool {
        match self {
            Capability::Read => stream.can_read(),
            Capability::Write => stream.can_write(),
            Capability::Seek => stream.can_seek(),
        }
    }
}

/// Snapshot of the capability flags of a stream.
///
/// The flags are derived from the stream state each time
/// [`Stream::capabilities()`](trait.Stream.html#method.capabilities) is
/// called. A snapshot is only a picture of that moment: closing the
/// stream afterward does not update it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub open: bool,
    pub read: bool,
    pub write: bool,
    pub seek: bool,
}

impl Capabilities {
    pub fn of<S: Stream + ?Sized>(stream: &S) -> Self {
        Capabilities {
            open: stream.is_open(),
            read: stream.can_read(),
            write: stream.can_write(),
            seek: stream.can_seek(),
        }
    }

    /// Flags of a closed stream.
    pub fn closed() -> Self {
        Capabilities {
            open: false,
            read: false,
            write: false,
            seek: false,
        }
    }

    /// Restrict these flags to what `other` allows.
    ///
    /// A view over another stream can never do more than the stream it
    /// looks at.
    pub fn intersect(self, other: Capabilities) -> Self {
        Capabilities {
            open: self.open && other.open,
            read: self.read && other.read,
            write: self.write && other.write,
            seek: self.seek && other.seek,
        }
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.open {
            return write!(f, "closed");
        }
        write!(
            f,
            "{}{}{}",
            if self.read { 'r' } else { '-' },
            if self.write { 'w' } else { '-' },
            if self.seek { 's' } else { '-' },
        )
    }
}

/// Fail with [`StreamError::NotOpen`] if `stream` is closed.
pub(crate) fn ensure_open<S: Stream + ?Sized>(
    stream: &S,
) -> StreamResult<()> {
    if stream.is_open() {
        Ok(())
    } else {
        Err(StreamError::NotOpen)
    }
}

/// Check preconditions of `operation` in order: the stream must be open,
/// then it must support `capability`.
pub(crate) fn ensure<S: Stream + ?Sized>(
    stream: &S,
    capability: Capability,
    operation: &'static str,
) -> StreamResult<()> {
    ensure_open(stream)?;
    if capability.of(stream) {
        Ok(())
    } else {
        Err(StreamError::unsupported(operation))
    }
}

#[cfg(test)]
mod tests {
    use super::Capabilities;

    #[test]
    fn test_display() {
        let caps = Capabilities {
            open: true,
            read: true,
            write: false,
            seek: true,
        };
        assert_eq!(caps.to_string(), "r-s");
        assert_eq!(Capabilities::closed().to_string(), "closed");
    }

    #[test]
    fn test_intersect() {
        let all = Capabilities {
            open: true,
            read: true,
            write: true,
            seek: true,
        };
        let read_only = Capabilities {
            open: true,
            read: true,
            write: false,
            seek: true,
        };
        assert_eq!(all.intersect(read_only), read_only);
        assert_eq!(all.intersect(Capabilities::closed()).open, false);
    }
}
