use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Closed state of a stream, observable by the views built on it.
///
/// A [`Lifecycle`] is a shared flag plus the lifecycle of the stream it
/// depends on, if any. Closing a lifecycle is visible from all its clones
/// and from every lifecycle derived from it with
/// [`child()`](struct.Lifecycle.html#method.child), but never from its
/// parent. This is how closing a stream closes its substreams while
/// closing a substream leaves its source untouched.
///
/// ```
/// use seekstream::Lifecycle;
///
/// let root = Lifecycle::new();
/// let left = root.child();
/// let right = root.child();
/// let nested = left.child();
///
/// left.close();
/// assert!(nested.is_closed());
/// assert!(!right.is_closed());
/// assert!(!root.is_closed());
///
/// root.close();
/// assert!(right.is_closed());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Lifecycle {
    closed: Arc<AtomicBool>,
    parent: Option<Arc<Lifecycle>>,
}

impl Lifecycle {
    /// A new open lifecycle without a parent.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new open lifecycle that closes whenever this one does.
    pub fn child(&self) -> Self {
        Lifecycle {
            closed: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::new(self.clone())),
        }
    }

    /// Mark this lifecycle, and therefore all its children, closed.
    ///
    /// Returns whether this call did close it, i.e `false` if it was
    /// already closed on its own account.
    pub fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    /// Whether this lifecycle or one of its ancestors is closed.
    pub fn is_closed(&self) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return true;
        }
        match &self.parent {
            Some(parent) => parent.is_closed(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Lifecycle;
    use std::thread;

    #[test]
    fn test_close_once() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.close());
        assert!(!lifecycle.close());
        assert!(lifecycle.is_closed());
    }

    #[test]
    fn test_child_closed_by_parent_only() {
        let root = Lifecycle::new();
        let child = root.child();
        // A child closed by its parent can still be closed on its own.
        root.close();
        assert!(child.is_closed());
        assert!(child.close());
    }

    #[test]
    fn test_clones_share_state() {
        let lifecycle = Lifecycle::new();
        let child = lifecycle.child();
        let clone = lifecycle.clone();
        thread::spawn(move || {
            clone.close();
        })
        .join()
        .unwrap();
        assert!(lifecycle.is_closed());
        assert!(child.is_closed());
    }
}
