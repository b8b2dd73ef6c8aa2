use crate::{
    ensure, ensure_open, Capability, Lifecycle, SharedStream, Stream,
    StreamError, StreamResult,
};
use log::{debug, trace};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Resolve the range `[from, to)` expressed in the coordinates of a view
/// into the coordinates of the view's root stream.
///
/// The view starts at `base_start` in the root and ends at `base_end`
/// (`None` if it follows the end of the root). `length` and `position`
/// are the current length and position of the view. `from` defaults to
/// `position` and a missing `to` inherits `base_end`.
pub(crate) fn resolve_range(
    base_start: u64,
    base_end: Option<u64>,
    length: u64,
    position: u64,
    from: Option<u64>,
    to: Option<u64>,
) -> StreamResult<(u64, Option<u64>)> {
    let from = from.unwrap_or(position);
    match to {
        Some(to) => {
            if from > to || to > length {
                return Err(StreamError::invalid_range(from, to, length));
            }
            Ok((base_start + from, Some(base_start + to)))
        }
        None => {
            if from > length {
                return Err(StreamError::invalid_range(from, length, length));
            }
            Ok((base_start + from, base_end))
        }
    }
}

/// Marks an end that follows the end of the backend.
const UNBOUNDED: u64 = u64::MAX;

/// Bounds of a substream in the root backend coordinates, chained to the
/// bounds of the substream it was built from.
#[derive(Debug)]
struct Window {
    start: u64,
    end: AtomicU64,
    parent: Option<Arc<Window>>,
}

impl Window {
    fn new(start: u64, end: Option<u64>, parent: Option<Arc<Window>>) -> Self {
        Window {
            start,
            end: AtomicU64::new(end.unwrap_or(UNBOUNDED)),
            parent,
        }
    }

    fn end(&self) -> Option<u64> {
        match self.end.load(Ordering::Acquire) {
            UNBOUNDED => None,
            end => Some(end),
        }
    }

    /// The tightest fixed end along the chain of windows.
    fn fixed_end(&self) -> Option<u64> {
        let parent = self.parent.as_ref().and_then(|p| p.fixed_end());
        match (self.end(), parent) {
            (Some(end), Some(parent)) => Some(end.min(parent)),
            (end, parent) => end.or(parent),
        }
    }

    /// End of the window, given the backend length.
    fn bound(&self, source_length: u64) -> u64 {
        match self.fixed_end() {
            Some(end) => end.min(source_length),
            None => source_length,
        }
    }

    /// Largest end this window can be resized to.
    fn resize_limit(&self, source_length: u64) -> u64 {
        match &self.parent {
            Some(parent) => parent.bound(source_length),
            None => source_length,
        }
    }
}

/// A view over the byte range `[start, end)` of a stream.
///
/// A [`Substream`] is obtained from
/// [`SharedStream::substream()`](struct.SharedStream.html#method.substream)
/// or from [`Substream::substream()`](#method.substream). It does not own
/// any storage: reads and writes go to the backend of the root
/// [`SharedStream`](struct.SharedStream.html), translated by the start of
/// the range. Nested substreams always resolve to a single range of the
/// root backend, and never reach past the current end of the substream
/// they were built from.
///
/// The substream cursor is independent from the backend cursor: each
/// transfer moves the backend cursor to the substream position and puts it
/// back where it was afterward.
///
/// The end of the range is either fixed or follows the end of the backend.
/// In the latter case, writing past the end grows the backend and the
/// substream with it. A fixed end is never crossed: writes are truncated
/// at the end of the range. In both cases the length of the substream is
/// computed at query time, such that a backend or a parent substream
/// shrinking below the range shrinks the substream as well.
///
/// Closing the substream only closes it and the substreams built on it.
/// Closing its source (the root backend or the substream it was built
/// from) closes it too.
#[derive(Debug)]
pub struct Substream<S> {
    source: SharedStream<S>,
    lifecycle: Lifecycle,
    window: Arc<Window>,
    /// Cursor in the root backend coordinates.
    cursor: u64,
}

impl<S: Stream> Substream<S> {
    pub(crate) fn new(
        source: SharedStream<S>,
        lifecycle: Lifecycle,
        start: u64,
        end: Option<u64>,
    ) -> Self {
        Self::with_window(source, lifecycle, Window::new(start, end, None))
    }

    fn with_window(
        source: SharedStream<S>,
        lifecycle: Lifecycle,
        window: Window,
    ) -> Self {
        debug!(
            "Substream over [{}, {:?}) created.",
            window.start,
            window.end()
        );
        let cursor = window.start;
        Substream {
            source,
            lifecycle,
            window: Arc::new(window),
            cursor,
        }
    }

    /// The range of this substream in the root backend coordinates.
    /// An unbounded end is `None`.
    pub fn range(&self) -> (u64, Option<u64>) {
        (self.window.start, self.window.end())
    }

    /// The root backend handle of this substream.
    pub fn source(&self) -> &SharedStream<S> {
        &self.source
    }

    /// Create a view over the range `[from, to)` of this substream.
    ///
    /// `from` and `to` are positions of this substream. `from` defaults to
    /// the current position. Without `to`, the new view ends where this
    /// substream ends. The new view is closed when this one is, and
    /// shrinks with it.
    ///
    /// Fails with [`StreamError::InvalidRange`] if the range does not fit
    /// within the current bounds of this substream.
    pub fn substream(
        &self,
        from: Option<u64>,
        to: Option<u64>,
    ) -> StreamResult<Substream<S>> {
        ensure_open(self)?;
        if !self.can_seek() {
            return Err(StreamError::unsupported("substream"));
        }
        let (start, end) = resolve_range(
            self.window.start,
            self.window.end(),
            self.length(),
            self.position(),
            from,
            to,
        )?;
        Ok(Substream::with_window(
            self.source.clone(),
            self.lifecycle.child(),
            Window::new(start, end, Some(Arc::clone(&self.window))),
        ))
    }

    /// Cursor clamped inside the range, given the backend length.
    fn clamped_cursor(&self, source_length: u64) -> u64 {
        let bound = self.window.bound(source_length);
        self.cursor.min(bound.max(self.window.start))
    }
}

/// Run `transfer` on `source` at `position`, then restore the cursor of
/// `source`.
fn detached<S: Stream, T>(
    source: &mut S,
    position: u64,
    transfer: impl FnOnce(&mut S) -> StreamResult<T>,
) -> StreamResult<T> {
    let saved = source.position();
    if !source.seek(position)? {
        return Err(StreamError::invalid_range(
            position,
            position,
            source.length(),
        ));
    }
    let result = transfer(source);
    source.seek(saved.min(source.length()))?;
    result
}

impl<S: Stream> Stream for Substream<S> {
    fn position(&self) -> u64 {
        let source_length = self.source.length();
        self.clamped_cursor(source_length)
            .saturating_sub(self.window.start)
    }

    fn length(&self) -> u64 {
        self.window
            .bound(self.source.length())
            .saturating_sub(self.window.start)
    }

    fn can_read(&self) -> bool {
        self.is_open() && self.source.can_read()
    }

    fn can_write(&self) -> bool {
        self.is_open() && self.source.can_write()
    }

    fn can_seek(&self) -> bool {
        self.is_open() && self.source.can_seek()
    }

    fn is_open(&self) -> bool {
        !self.lifecycle.is_closed() && self.source.is_open()
    }

    fn seek(&mut self, position: u64) -> StreamResult<bool> {
        ensure(&*self, Capability::Seek, "seek")?;
        if position > self.length() {
            return Ok(false);
        }
        self.cursor = self.window.start + position;
        Ok(true)
    }

    fn read(&mut self, length: usize, exact: bool) -> StreamResult<Vec<u8>> {
        ensure(&*self, Capability::Read, "read")?;
        let mut source = self.source.get_mut();
        let source_length = source.length();
        let cursor = self.clamped_cursor(source_length);
        let available =
            self.window.bound(source_length).saturating_sub(cursor);
        let count = (length as u64).min(available) as usize;
        if exact && count < length {
            return Err(StreamError::ShortRead {
                attempted: length,
                actual: count,
            });
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let data = detached(&mut *source, cursor, |s| s.read(count, false))?;
        if exact && data.len() < length {
            return Err(StreamError::ShortRead {
                attempted: length,
                actual: data.len(),
            });
        }
        trace!("Substream read {} bytes at {}.", data.len(), cursor);
        self.cursor = cursor + data.len() as u64;
        Ok(data)
    }

    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        ensure(&*self, Capability::Write, "write")?;
        let mut source = self.source.get_mut();
        let cursor = self.clamped_cursor(source.length());
        let count = match self.window.fixed_end() {
            Some(end) => {
                (data.len() as u64).min(end.saturating_sub(cursor)) as usize
            }
            None => data.len(),
        };
        if count == 0 {
            return Ok(0);
        }

        let written =
            match detached(&mut *source, cursor, |s| s.write(&data[..count])) {
                Ok(written) => written,
                Err(err) => {
                    if let StreamError::ShortWrite { actual, .. } = err {
                        self.cursor = cursor + actual as u64;
                    }
                    return Err(err);
                }
            };
        trace!("Substream wrote {} bytes at {}.", written, cursor);
        self.cursor = cursor + written as u64;
        Ok(written)
    }

    fn resize(&mut self, length: u64) -> StreamResult<bool> {
        ensure(&*self, Capability::Write, "resize")?;
        let (start, previous) = self.range();
        let limit = self.window.resize_limit(self.source.length());
        let end = match start.checked_add(length) {
            Some(end) if end <= limit => end,
            _ => return Ok(false),
        };
        debug!(
            "Substream [{}, {:?}) resized to [{}, {}).",
            start, previous, start, end
        );
        self.window.end.store(end, Ordering::Release);
        self.cursor = self.cursor.min(end);
        Ok(true)
    }

    fn close(&mut self) -> StreamResult<()> {
        if self.lifecycle.close() {
            let (start, end) = self.range();
            debug!("Substream [{}, {:?}) closed.", start, end);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_range;
    use crate::streams::MemoryStream;
    use crate::{SharedStream, Stream, StreamError};

    fn digits() -> SharedStream<MemoryStream> {
        SharedStream::new(MemoryStream::from(b"0123456789".to_vec()))
    }

    #[test]
    fn test_resolve_range() {
        assert_eq!(
            resolve_range(10, Some(50), 40, 0, Some(5), Some(20)).unwrap(),
            (15, Some(30))
        );
        assert_eq!(
            resolve_range(10, None, 40, 3, None, None).unwrap(),
            (13, None)
        );
        assert!(matches!(
            resolve_range(0, None, 10, 0, Some(5), Some(4)),
            Err(StreamError::InvalidRange { .. })
        ));
        assert!(matches!(
            resolve_range(0, None, 10, 0, Some(11), None),
            Err(StreamError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_contract() {
        let source = SharedStream::new(MemoryStream::new());
        crate::tests::test_stream(source.substream(None, None).unwrap());
    }

    #[test]
    fn test_contract_with_offset() {
        let mut source = SharedStream::new(MemoryStream::new());
        source.write(b"header").unwrap();
        crate::tests::test_stream(source.substream(None, None).unwrap());
        assert_eq!(source.read_from(0, 6, true).unwrap(), b"header".to_vec());
    }

    #[test]
    fn test_read_matches_source() {
        let mut source = digits();
        let mut sub = source.substream(Some(3), Some(8)).unwrap();
        assert_eq!(sub.position(), 0);
        assert_eq!(sub.length(), 5);
        assert_eq!(
            sub.read(4, true).unwrap(),
            source.read_from(3, 4, true).unwrap()
        );
    }

    #[test]
    fn test_cursor_decoupled() {
        let mut source = digits();
        assert!(source.seek(7).unwrap());
        let mut sub = source.substream(Some(0), Some(5)).unwrap();
        assert_eq!(sub.read(2, true).unwrap(), b"01".to_vec());
        assert_eq!(source.position(), 7);
        assert_eq!(sub.position(), 2);
        assert_eq!(source.read(1, true).unwrap(), b"7".to_vec());
        assert_eq!(sub.position(), 2);
    }

    #[test]
    fn test_default_from_is_position() {
        let mut source = digits();
        assert!(source.seek(4).unwrap());
        let mut sub = source.substream(None, None).unwrap();
        assert_eq!(sub.range(), (4, None));
        assert_eq!(sub.read(10, false).unwrap(), b"456789".to_vec());
    }

    #[test]
    fn test_seek_bounds() {
        let source = digits();
        let mut sub = source.substream(Some(2), Some(6)).unwrap();
        assert!(sub.seek(4).unwrap());
        assert_eq!(sub.position(), 4);
        assert!(!sub.seek(5).unwrap());
        assert_eq!(sub.position(), 4);
        assert!(sub.seek(0).unwrap());
        assert!(!sub.seek_relative(-1).unwrap());
        assert_eq!(sub.position(), 0);
    }

    #[test]
    fn test_fixed_end_not_crossed() {
        let mut source = digits();
        let mut sub = source.substream(Some(2), Some(5)).unwrap();
        assert!(sub.seek(1).unwrap());
        assert_eq!(sub.write(b"abcdef").unwrap(), 2);
        assert_eq!(sub.position(), 3);
        assert_eq!(sub.write(b"x").unwrap(), 0);
        assert!(matches!(
            sub.write_exact(b"x"),
            Err(StreamError::ShortWrite {
                attempted: 1,
                actual: 0
            })
        ));
        assert_eq!(source.length(), 10);
        assert_eq!(
            source.read_from(0, 10, true).unwrap(),
            b"012ab56789".to_vec()
        );
    }

    #[test]
    fn test_unbounded_end_grows_source() {
        let mut source = digits();
        let mut sub = source.substream(Some(8), None).unwrap();
        assert_eq!(sub.length(), 2);
        assert!(sub.seek(2).unwrap());
        assert_eq!(sub.write(b"abc").unwrap(), 3);
        assert_eq!(sub.length(), 5);
        assert_eq!(source.length(), 13);
        assert_eq!(source.read_from(8, 5, true).unwrap(), b"89abc".to_vec());
    }

    #[test]
    fn test_length_follows_source() {
        let mut source = digits();
        let sub = source.substream(Some(4), Some(8)).unwrap();
        assert!(source.resize(6).unwrap());
        assert_eq!(sub.length(), 2);
        assert!(source.resize(2).unwrap());
        assert_eq!(sub.length(), 0);
        assert_eq!(sub.position(), 0);
    }

    #[test]
    fn test_resize_within_source() {
        let source = digits();
        let mut sub = source.substream(Some(2), Some(4)).unwrap();
        assert!(sub.resize(6).unwrap());
        assert_eq!(sub.range(), (2, Some(8)));
        assert!(sub.resize(8).unwrap());
        assert!(!sub.resize(9).unwrap());
        assert_eq!(sub.length(), 8);

        assert!(sub.seek(8).unwrap());
        assert!(sub.resize(3).unwrap());
        assert_eq!(sub.position(), 3);
        assert_eq!(sub.read(1, false).unwrap(), Vec::<u8>::new());
        // Never grows the source.
        assert_eq!(source.length(), 10);
    }

    #[test]
    fn test_exact_read() {
        let source = digits();
        let mut sub = source.substream(Some(6), Some(9)).unwrap();
        assert!(matches!(
            sub.read(4, true),
            Err(StreamError::ShortRead {
                attempted: 4,
                actual: 3
            })
        ));
        assert_eq!(sub.position(), 0);
        assert_eq!(sub.read(4, false).unwrap(), b"678".to_vec());
        assert_eq!(sub.read(4, false).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_nested_range() {
        let source =
            SharedStream::new(MemoryStream::from(vec![0u8; 100]));
        let outer = source.substream(Some(10), Some(50)).unwrap();
        let inner = outer.substream(Some(5), Some(20)).unwrap();
        assert_eq!(inner.range(), (15, Some(30)));
        assert_eq!(inner.length(), 15);
        assert!(matches!(
            outer.substream(Some(30), Some(41)),
            Err(StreamError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_nested_inherits_end() {
        let source = digits();
        let outer = source.substream(Some(1), Some(9)).unwrap();
        let inner = outer.substream(Some(2), None).unwrap();
        assert_eq!(inner.range(), (3, Some(9)));
        let unbounded = source.substream(Some(1), None).unwrap();
        assert_eq!(unbounded.substream(Some(2), None).unwrap().range(), (3, None));
    }

    #[test]
    fn test_nested_bounded_by_parent() {
        let source =
            SharedStream::new(MemoryStream::from((0u8..100).collect::<Vec<_>>()));
        let mut outer = source.substream(Some(10), Some(50)).unwrap();
        let mut inner = outer.substream(Some(5), Some(20)).unwrap();
        assert!(!inner.resize(80).unwrap());
        assert_eq!(inner.range(), (15, Some(30)));
        assert!(inner.resize(35).unwrap());
        assert!(!inner.resize(36).unwrap());
        assert_eq!(inner.length(), 35);

        let mut tail = inner.substream(Some(30), Some(35)).unwrap();
        assert_eq!(
            tail.read(10, false).unwrap(),
            (45u8..50).collect::<Vec<_>>()
        );

        // Shrinking a parent shrinks the views built on it.
        assert!(outer.resize(20).unwrap());
        assert_eq!(inner.length(), 15);
        assert_eq!(tail.length(), 0);
        assert_eq!(tail.read(1, false).unwrap(), Vec::<u8>::new());
        assert!(inner.seek(15).unwrap());
        assert!(!inner.seek(16).unwrap());
        assert_eq!(inner.write(b"abc").unwrap(), 0);
        assert_eq!(source.length(), 100);
    }

    #[test]
    fn test_short_write_advances_cursor() {
        let source = SharedStream::new(
            MemoryStream::from(b"0123".to_vec()).fixed_capacity(),
        );
        let mut sub = source.substream(Some(2), None).unwrap();
        assert!(matches!(
            sub.write(b"abcd"),
            Err(StreamError::ShortWrite {
                attempted: 4,
                actual: 2
            })
        ));
        assert_eq!(sub.position(), 2);
        assert_eq!(source.position(), 0);
        assert_eq!(source.get().contents(), b"01ab");
    }

    #[test]
    fn test_close_cascade() {
        let mut source = digits();
        let mut outer = source.substream(Some(1), Some(9)).unwrap();
        let mut sibling = source.substream(Some(0), Some(2)).unwrap();
        let mut inner = outer.substream(Some(1), Some(3)).unwrap();

        outer.close().unwrap();
        outer.close().unwrap();
        assert!(!outer.is_open());
        assert!(!inner.is_open());
        assert!(matches!(inner.read(1, false), Err(StreamError::NotOpen)));
        assert!(matches!(outer.seek(0), Err(StreamError::NotOpen)));
        assert!(source.is_open());
        assert_eq!(sibling.read(2, true).unwrap(), b"01".to_vec());

        source.close().unwrap();
        assert!(!sibling.is_open());
        assert!(!sibling.can_read());
        assert!(matches!(sibling.write(b"a"), Err(StreamError::NotOpen)));
        assert!(matches!(
            sibling.substream(None, None),
            Err(StreamError::NotOpen)
        ));
        inner.close().unwrap();
    }

    #[test]
    fn test_capabilities_follow_source() {
        let source = SharedStream::new(
            MemoryStream::from(b"0123".to_vec()).read_only(),
        );
        let mut sub = source.substream(Some(0), Some(4)).unwrap();
        assert!(sub.can_read());
        assert!(sub.can_seek());
        assert!(!sub.can_write());
        assert!(matches!(
            sub.write(b"a"),
            Err(StreamError::Unsupported { .. })
        ));
        assert!(matches!(
            sub.resize(1),
            Err(StreamError::Unsupported { .. })
        ));
    }
}
