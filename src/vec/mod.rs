//! `LockFreeVec`: an unbounded, indexable vector with lock-free append and pop.
//!
//! Storage is a root array of doubling buckets (see [`crate::addressing`]), so
//! growth never copies an element. Size changes are serialized by a single
//! CAS on an immutable descriptor `{size, most recent write}`:
//!
//! 1. Load the live descriptor `D`.
//! 2. Help finish `D`'s write if it is still pending.
//! 3. Try to swap `D` for `D'` (one longer with a new pending write, or one
//!    shorter with no write at all).
//!
//! Whoever wins the CAS owns the size change, but *any* thread may perform the
//! pending slot write. A preempted appender therefore never blocks the others.
//!
//! Replaced descriptors and overwritten elements are retired through
//! `crossbeam-epoch`.

mod buckets;
mod descriptor;
mod iter;


use core::fmt;
use core::sync::atomic::Ordering;

use crossbeam_epoch::{self as epoch, Atomic, Guard, Owned, Shared};
use crossbeam_utils::CachePadded;

use crate::addressing::{self, MAX_LEN};
use crate::error::IndexOutOfRange;

use buckets::Buckets;
use descriptor::{Descriptor, WriteOperation};

pub use iter::Iter;

/// A lock-free, dynamically growing vector.
///
/// All operations take `&self` and may be called from any number of threads.
/// `append` and `remove_tail` are linearized by the descriptor CAS; `get` and
/// `set` are not ordered against each other beyond their bounds check.
///
/// # Weak operations
///
/// - [`set`](Self::set) is a plain atomic overwrite of one slot. It does not
///   take part in the descriptor protocol, so racing a `set` against a
///   `remove_tail` or `append` on the same index may lose either value.
/// - [`remove_tail`](Self::remove_tail) always pops the last element; its
///   index argument is ignored.
///
/// # Example
///
/// ```
/// use lockfree_vec::LockFreeVec;
/// use std::thread;
///
/// let vec = LockFreeVec::new();
/// thread::scope(|s| {
///     for t in 0..4 {
///         let vec = &vec;
///         s.spawn(move || {
///             for i in 0..100 {
///                 vec.append(t * 100 + i);
///             }
///         });
///     }
/// });
/// assert_eq!(vec.size(), 400);
/// ```
pub struct LockFreeVec<T> {
    descriptor: CachePadded<Atomic<Descriptor<T>>>,
    buckets: Buckets<T>,
}

impl<T> LockFreeVec<T> {
    /// Creates an empty vector. Nothing is allocated until the first append.
    pub const fn new() -> Self {
        Self {
            descriptor: CachePadded::new(Atomic::null()),
            buckets: Buckets::new(),
        }
    }

    /// Returns the number of readable elements.
    ///
    /// An append whose element is not yet published is not counted, so the
    /// result may undercount but never promises an unwritten slot.
    pub fn size(&self) -> usize {
        let guard = &epoch::pin();
        let current = self.descriptor.load(Ordering::Acquire, guard);
        // SAFETY: descriptors are only destroyed through the epoch collector.
        unsafe { current.as_ref() }.map_or(0, Descriptor::len)
    }

    /// Alias for [`size`](Self::size).
    #[inline]
    pub fn len(&self) -> usize {
        self.size()
    }

    /// Returns `true` if no element is readable.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Total number of slots in allocated buckets.
    ///
    /// Buckets are never freed, so this does not shrink after pops.
    pub fn capacity(&self) -> usize {
        self.buckets.capacity()
    }

    fn check_bounds(&self, index: usize) -> Result<(), IndexOutOfRange> {
        let len = self.size();
        if index < len {
            Ok(())
        } else {
            Err(IndexOutOfRange::new(index, len))
        }
    }

    /// Loads the live descriptor, installing the empty one if there is none yet.
    fn current_or_init<'g>(&self, guard: &'g Guard) -> Shared<'g, Descriptor<T>> {
        let current = self.descriptor.load(Ordering::Acquire, guard);
        if !current.is_null() {
            return current;
        }
        match self.descriptor.compare_exchange(
            Shared::null(),
            Owned::new(Descriptor::empty()),
            Ordering::AcqRel,
            Ordering::Acquire,
            guard,
        ) {
            Ok(installed) => {
                #[cfg(feature = "tracing")]
                tracing::trace!("installed initial descriptor");
                installed
            }
            // Lost to another initializer; theirs is as good as ours.
            Err(err) => err.current,
        }
    }
}

impl<T: Clone + Send + 'static> LockFreeVec<T> {
    /// Performs `op`'s slot write unless it has already completed.
    ///
    /// Safe to call from any number of threads on the same operation. Each
    /// helper installs its own copy of the element with a CAS against the slot
    /// value it sampled *before* re-checking `pending`, so a helper that stalls
    /// past completion can never overwrite a later store to the same slot.
    pub(crate) fn complete_write(&self, op: &WriteOperation<T>, guard: &Guard) {
        if !op.is_pending() {
            return;
        }
        let Some(element) = op.element() else {
            op.finish();
            return;
        };

        let (bucket, offset) = addressing::locate(op.index);
        let slot = &self.buckets.ensure(bucket)[offset];

        let mut current = slot.load(Ordering::SeqCst, guard);
        let mut candidate = Owned::new(element.clone());
        while op.is_pending() {
            match slot.compare_exchange(
                current,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
                guard,
            ) {
                Ok(_) => {
                    if !current.is_null() {
                        // SAFETY: the CAS unlinked `current` from its only slot.
                        unsafe { guard.defer_destroy(current) };
                    }
                    break;
                }
                Err(err) => {
                    current = err.current;
                    candidate = err.new;
                }
            }
        }

        op.finish();
    }

    /// Appends `element` at the end of the vector.
    ///
    /// The index it lands at is decided by the descriptor CAS order, not by
    /// call order.
    ///
    /// # Panics
    /// Panics if the length would exceed [`MAX_LEN`].
    pub fn append(&self, element: T) {
        let guard = &epoch::pin();
        let mut current = self.current_or_init(guard);
        let mut next = Owned::new(Descriptor::new(0, WriteOperation::pending(0, element)));

        loop {
            // SAFETY: `current` is non-null and protected by `guard`.
            let desc = unsafe { current.deref() };
            self.complete_write(&desc.op, guard);

            assert!(desc.size < MAX_LEN, "LockFreeVec: capacity overflow");
            next.size = desc.size + 1;
            next.op.index = desc.size;

            match self.descriptor.compare_exchange(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
                guard,
            ) {
                Ok(installed) => {
                    // SAFETY: `current` is unreachable from the vector now.
                    unsafe { guard.defer_destroy(current) };
                    // SAFETY: `installed` was just published under `guard`.
                    self.complete_write(unsafe { &installed.deref().op }, guard);
                    return;
                }
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!("append lost descriptor race, retrying");
                    current = err.current;
                    next = err.new;
                }
            }
        }
    }

    /// Removes and returns the last element.
    ///
    /// `index` is accepted for call-site compatibility with indexed removal and
    /// is otherwise ignored: the tail is always removed. The slot is not
    /// cleared; it is simply no longer counted by [`size`](Self::size).
    ///
    /// # Errors
    /// Returns [`IndexOutOfRange`] if the vector is empty.
    pub fn remove_tail(&self, index: usize) -> Result<T, IndexOutOfRange> {
        let guard = &epoch::pin();
        let mut current = self.descriptor.load(Ordering::Acquire, guard);

        loop {
            // SAFETY: descriptors are only destroyed through the epoch collector.
            let desc = match unsafe { current.as_ref() } {
                Some(desc) if desc.size > 0 => desc,
                _ => return Err(IndexOutOfRange::new(index, 0)),
            };

            self.complete_write(&desc.op, guard);

            let tail = desc.size - 1;
            debug_assert_eq!(desc.op.index, tail);
            let element = self.read_slot(tail, guard);

            let next = Owned::new(Descriptor::new(
                tail,
                WriteOperation::completed(tail.saturating_sub(1)),
            ));
            match self.descriptor.compare_exchange(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
                guard,
            ) {
                Ok(_) => {
                    // SAFETY: `current` is unreachable from the vector now.
                    unsafe { guard.defer_destroy(current) };
                    return Ok(element);
                }
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!("remove_tail lost descriptor race, retrying");
                    current = err.current;
                }
            }
        }
    }

    /// Pops the last element, or returns `None` if the vector is empty.
    #[inline]
    pub fn pop(&self) -> Option<T> {
        self.remove_tail(0).ok()
    }

    /// Replaces the element at `index`, returning the previous one.
    ///
    /// This is a single atomic swap on the slot and is not ordered against
    /// concurrent appends or pops; see the type-level docs.
    ///
    /// # Errors
    /// Returns [`IndexOutOfRange`] if `index >= size()`.
    pub fn set(&self, index: usize, element: T) -> Result<T, IndexOutOfRange> {
        self.check_bounds(index)?;

        let guard = &epoch::pin();
        let slot = self.buckets.slot(index).expect("counted index has an allocated bucket");
        let previous = slot.swap(Owned::new(element), Ordering::SeqCst, guard);

        // SAFETY: `previous` is protected by `guard` until destroyed below.
        let value = unsafe { previous.as_ref() }
            .expect("counted index has a published element")
            .clone();
        // SAFETY: the swap unlinked `previous` from its only slot.
        unsafe { guard.defer_destroy(previous) };
        Ok(value)
    }
}

impl<T: Clone> LockFreeVec<T> {
    /// Returns a copy of the element at `index`.
    ///
    /// # Errors
    /// Returns [`IndexOutOfRange`] if `index >= size()`.
    pub fn get(&self, index: usize) -> Result<T, IndexOutOfRange> {
        self.check_bounds(index)?;
        Ok(self.read_slot(index, &epoch::pin()))
    }

    /// Returns a snapshot iterator over `0..size()` as observed now.
    ///
    /// Each element is read independently; iteration stops early if
    /// concurrent pops shrink the vector below the snapshot length.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self, self.size())
    }

    /// Reads a slot that the descriptor protocol has already published.
    fn read_slot(&self, index: usize, guard: &Guard) -> T {
        let slot = self.buckets.slot(index).expect("counted index has an allocated bucket");
        let element = slot.load(Ordering::SeqCst, guard);
        // SAFETY: `element` is protected by `guard`.
        unsafe { element.as_ref() }
            .expect("counted index has a published element")
            .clone()
    }
}

impl<T> Default for LockFreeVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// `{:?}` lists the readable elements.
///
/// `{:#?}` dumps the storage instead: one line per allocated bucket, showing
/// every slot including those past the tail, with `_` for never-written slots.
impl<T: Clone + fmt::Debug> fmt::Debug for LockFreeVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !f.alternate() {
            return f.debug_list().entries(self.iter()).finish();
        }

        let guard = &epoch::pin();
        for (line, slots) in self.buckets.allocated().enumerate() {
            if line > 0 {
                f.write_str("\n")?;
            }
            f.write_str("[")?;
            for (offset, slot) in slots.iter().enumerate() {
                if offset > 0 {
                    f.write_str(", ")?;
                }
                // SAFETY: slot elements are only destroyed through the epoch collector.
                match unsafe { slot.load(Ordering::SeqCst, guard).as_ref() } {
                    Some(element) => write!(f, "{element:?}")?,
                    None => f.write_str("_")?,
                }
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

impl<T: Clone + Send + 'static> FromIterator<T> for LockFreeVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let vec = Self::new();
        for element in iter {
            vec.append(element);
        }
        vec
    }
}

impl<T: Clone + Send + 'static> Extend<T> for LockFreeVec<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for element in iter {
            self.append(element);
        }
    }
}

impl<T: Clone + Send + 'static> Extend<T> for &LockFreeVec<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for element in iter {
            self.append(element);
        }
    }
}

impl<T> Drop for LockFreeVec<T> {
    fn drop(&mut self) {
        // Slots own their own copies, so the live descriptor can be dropped
        // whether or not its write is still pending.
        // SAFETY: `&mut self` means no other thread can observe the descriptor.
        unsafe {
            let current = self.descriptor.load(Ordering::Relaxed, epoch::unprotected());
            if !current.is_null() {
                drop(current.into_owned());
            }
        }
    }
}
