//! Immutable descriptor snapshots exchanged through the descriptor CAS.

use core::sync::atomic::{AtomicBool, Ordering};

/// A single-slot write: `element` at logical `index`.
///
/// `pending` goes `true -> false` exactly once, after the element has been
/// stored. It is read and written with `SeqCst`, the same ordering as the slot
/// accesses, so observing `false` implies the element is visible.
pub(crate) struct WriteOperation<T> {
    pub(crate) index: usize,
    element: Option<T>,
    pending: AtomicBool,
}

impl<T> WriteOperation<T> {
    /// A write that still has to be performed.
    pub(crate) fn pending(index: usize, element: T) -> Self {
        Self {
            index,
            element: Some(element),
            pending: AtomicBool::new(true),
        }
    }

    /// A placeholder with no slot write attached, used after a pop and for
    /// the initial descriptor.
    pub(crate) fn completed(index: usize) -> Self {
        Self {
            index,
            element: None,
            pending: AtomicBool::new(false),
        }
    }

    #[inline]
    pub(crate) fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// The element to store. `None` only for placeholders, which are never pending.
    #[inline]
    pub(crate) fn element(&self) -> Option<&T> {
        self.element.as_ref()
    }

    #[inline]
    pub(crate) fn finish(&self) {
        self.pending.store(false, Ordering::SeqCst);
    }
}

/// `{size, most recent write}`. The live descriptor is the single point of
/// truth for the vector's length.
pub(crate) struct Descriptor<T> {
    pub(crate) size: usize,
    pub(crate) op: WriteOperation<T>,
}

impl<T> Descriptor<T> {
    /// The descriptor installed by the first append: empty, nothing pending.
    pub(crate) fn empty() -> Self {
        Self {
            size: 0,
            op: WriteOperation::completed(0),
        }
    }

    pub(crate) fn new(size: usize, op: WriteOperation<T>) -> Self {
        Self { size, op }
    }

    /// Number of readable elements: an in-flight append is not counted yet.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        if self.op.is_pending() {
            self.size - 1
        } else {
            self.size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_write_is_not_counted() {
        let desc = Descriptor::new(3, WriteOperation::pending(2, 'c'));
        assert!(desc.op.is_pending());
        assert_eq!(desc.len(), 2);

        desc.op.finish();
        assert!(!desc.op.is_pending());
        assert_eq!(desc.len(), 3);
    }

    #[test]
    fn test_placeholder() {
        let desc = Descriptor::<String>::empty();
        assert_eq!(desc.len(), 0);
        assert!(desc.op.element().is_none());
    }
}
