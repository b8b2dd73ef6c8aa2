use crate::substream::resolve_range;
use crate::{
    ensure_open, Lifecycle, Stream, StreamError, StreamResult, Substream,
};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Reference counted handle on a backend [`Stream`](trait.Stream.html).
///
/// [`SharedStream`] stores the backend on the heap and can create shadow
/// copies, i.e copies of the handle to the same backend. The backend is
/// dropped when the last copy of the handle, or of a
/// [`Substream`](struct.Substream.html) built on it, is dropped.
///
/// All the copies share the backend, and therefore its cursor. A
/// [`Substream`](struct.Substream.html) obtained with
/// [`substream()`](struct.SharedStream.html#method.substream) has its own
/// cursor instead.
///
/// Access to the backend goes through a read-write lock embedded in the
/// handle: capability queries take the read lock while transfers take the
/// write lock for the duration of a single operation. A lock poisoned by
/// a panicking thread is recovered, since a stream keeps its invariants
/// between operations.
///
/// ## Example
///
/// ```
/// use seekstream::{SharedStream, Stream};
/// use seekstream::streams::MemoryStream;
///
/// let mut stream = SharedStream::new(MemoryStream::new());
/// stream.write(b"0123456789").unwrap();
///
/// let mut digits = stream.substream(Some(2), Some(5)).unwrap();
/// assert_eq!(digits.read(3, true).unwrap(), b"234".to_vec());
///
/// // Closing the backend closes the views built on it.
/// stream.close().unwrap();
/// assert!(!digits.is_open());
/// ```
#[derive(Debug)]
pub struct SharedStream<S> {
    ptr: Arc<RwLock<S>>,
    lifecycle: Lifecycle,
}

impl<S> SharedStream<S> {
    /// Wrap a backend into a reference counting cell and move it on the
    /// heap.
    pub fn new(stream: S) -> Self {
        SharedStream {
            ptr: Arc::new(RwLock::new(stream)),
            lifecycle: Lifecycle::new(),
        }
    }

    /// Gain read-only access to the backend, blocking while another
    /// thread holds write access.
    pub fn get(&self) -> RwLockReadGuard<'_, S> {
        self.ptr.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Gain exclusive access to the backend, blocking while any other
    /// thread holds access.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, S> {
        self.ptr.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The lifecycle substreams of this stream derive theirs from.
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}

impl<S: Stream> SharedStream<S> {
    /// Create a view over the range `[from, to)` of this stream.
    ///
    /// `from` defaults to the current position and `to` defaults to the
    /// end of the stream, wherever it is when the view is used: a view
    /// without `to` grows with the stream. The view starts at position 0.
    ///
    /// Fails with [`StreamError::InvalidRange`] if the range does not fit
    /// within the stream, and with
    /// [`StreamError::Unsupported`] if the stream cannot seek.
    pub fn substream(
        &self,
        from: Option<u64>,
        to: Option<u64>,
    ) -> StreamResult<Substream<S>> {
        ensure_open(self)?;
        let (start, end) = {
            let stream = self.get();
            if !stream.can_seek() {
                return Err(StreamError::unsupported("substream"));
            }
            resolve_range(
                0,
                None,
                stream.length(),
                stream.position(),
                from,
                to,
            )?
        };
        Ok(Substream::new(
            self.clone(),
            self.lifecycle.child(),
            start,
            end,
        ))
    }
}

impl<S> From<S> for SharedStream<S> {
    fn from(stream: S) -> Self {
        Self::new(stream)
    }
}

impl<S> Clone for SharedStream<S> {
    /// Create a shadow copy of the handle, pointing to the same backend.
    fn clone(&self) -> Self {
        SharedStream {
            ptr: self.ptr.clone(),
            lifecycle: self.lifecycle.clone(),
        }
    }
}

impl<S: Stream> Stream for SharedStream<S> {
    fn position(&self) -> u64 {
        self.get().position()
    }

    fn length(&self) -> u64 {
        self.get().length()
    }

    fn can_read(&self) -> bool {
        self.get().can_read()
    }

    fn can_write(&self) -> bool {
        self.get().can_write()
    }

    fn can_seek(&self) -> bool {
        self.get().can_seek()
    }

    fn is_open(&self) -> bool {
        !self.lifecycle.is_closed() && self.get().is_open()
    }

    fn seek(&mut self, position: u64) -> StreamResult<bool> {
        self.get_mut().seek(position)
    }

    fn read(&mut self, length: usize, exact: bool) -> StreamResult<Vec<u8>> {
        self.get_mut().read(length, exact)
    }

    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        self.get_mut().write(data)
    }

    fn resize(&mut self, length: u64) -> StreamResult<bool> {
        self.get_mut().resize(length)
    }

    fn close(&mut self) -> StreamResult<()> {
        self.lifecycle.close();
        self.get_mut().close()
    }
}

#[cfg(test)]
mod tests {
    use super::SharedStream;
    use crate::streams::MemoryStream;
    use crate::{Stream, StreamError};
    use std::thread;

    #[test]
    fn test_contract() {
        crate::tests::test_stream(SharedStream::new(MemoryStream::new()));
    }

    #[test]
    fn test_clones_share_cursor() {
        let mut a = SharedStream::new(MemoryStream::new());
        let mut b = a.clone();
        a.write(b"abcd").unwrap();
        assert_eq!(b.position(), 4);
        assert!(b.seek(1).unwrap());
        assert_eq!(a.read(2, true).unwrap(), b"bc".to_vec());
    }

    #[test]
    fn test_concurrent_writers() {
        let stream = SharedStream::new(MemoryStream::new());
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let s = stream.clone();
                thread::spawn(move || {
                    let mut view = s.substream(Some(0), None).unwrap();
                    view.write_at(i as u64, &[i]).ok();
                    s.length()
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(stream.length() <= 8);
    }

    #[test]
    fn test_substream_requires_open() {
        let mut stream = SharedStream::new(MemoryStream::new());
        stream.close().unwrap();
        assert!(matches!(
            stream.substream(None, None),
            Err(StreamError::NotOpen)
        ));
    }
}
