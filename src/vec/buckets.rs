//! Lazily allocated, never-moved bucket storage.
//!
//! The root array holds one pointer per bucket plus a one-shot allocation
//! marker. The thread that flips a marker `false -> true` allocates the bucket
//! and publishes it; every other contender snoozes until the pointer shows up.

use core::marker::PhantomData;
use core::ptr;
use core::slice;
use core::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use crossbeam_epoch::{self as epoch, Atomic};
use crossbeam_utils::Backoff;

use crate::addressing::{self, ROOT_SIZE};

/// One element slot. Null means "never written".
pub(crate) type Slot<T> = Atomic<T>;

pub(crate) struct Buckets<T> {
    roots: [AtomicPtr<Slot<T>>; ROOT_SIZE],
    markers: [AtomicBool; ROOT_SIZE],
    _owns: PhantomData<T>,
}

impl<T> Buckets<T> {
    pub(crate) const fn new() -> Self {
        Self {
            roots: [const { AtomicPtr::new(ptr::null_mut()) }; ROOT_SIZE],
            markers: [const { AtomicBool::new(false) }; ROOT_SIZE],
            _owns: PhantomData,
        }
    }

    /// Returns the slots of `bucket` if it has been published.
    #[inline]
    pub(crate) fn get(&self, bucket: usize) -> Option<&[Slot<T>]> {
        let ptr = self.roots[bucket].load(Ordering::Acquire);
        if ptr.is_null() {
            return None;
        }
        // SAFETY: a published root points at a `bucket_len(bucket)` slice that
        // lives as long as `self`.
        Some(unsafe { slice::from_raw_parts(ptr, addressing::bucket_len(bucket)) })
    }

    /// Allocates `bucket` unless it already exists, then returns its slots.
    ///
    /// Exactly one caller performs the allocation; repeated calls are no-ops.
    pub(crate) fn ensure(&self, bucket: usize) -> &[Slot<T>] {
        if let Some(slots) = self.get(bucket) {
            return slots;
        }

        if self.markers[bucket]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let len = addressing::bucket_len(bucket);
            let slots: Box<[Slot<T>]> = (0..len).map(|_| Atomic::null()).collect();
            let ptr = Box::into_raw(slots).cast::<Slot<T>>();
            self.roots[bucket].store(ptr, Ordering::Release);

            #[cfg(feature = "tracing")]
            tracing::trace!(bucket, len, "allocated bucket");

            // SAFETY: `ptr` was just built from a boxed slice of `len` slots.
            return unsafe { slice::from_raw_parts(ptr, len) };
        }

        // Another thread owns the marker; wait for its store to become visible.
        let backoff = Backoff::new();
        loop {
            if let Some(slots) = self.get(bucket) {
                return slots;
            }
            backoff.snooze();
        }
    }

    /// Returns the slot for `index` if its bucket exists.
    #[inline]
    pub(crate) fn slot(&self, index: usize) -> Option<&Slot<T>> {
        let (bucket, offset) = addressing::locate(index);
        self.get(bucket).map(|slots| &slots[offset])
    }

    /// Iterates the published buckets in root order.
    pub(crate) fn allocated(&self) -> impl Iterator<Item = &[Slot<T>]> + '_ {
        (0..ROOT_SIZE).filter_map(move |bucket| self.get(bucket))
    }

    /// Total number of slots across published buckets.
    pub(crate) fn capacity(&self) -> usize {
        self.allocated().map(<[_]>::len).sum()
    }
}

impl<T> Drop for Buckets<T> {
    fn drop(&mut self) {
        for (bucket, root) in self.roots.iter_mut().enumerate() {
            let ptr = *root.get_mut();
            if ptr.is_null() {
                continue;
            }
            let len = addressing::bucket_len(bucket);
            // SAFETY: `ptr` came from `Box::into_raw` on a slice of `len` slots
            // and `&mut self` rules out concurrent readers.
            let slots = unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, len)) };
            for slot in slots.iter() {
                // SAFETY: each stored element is owned by exactly one slot.
                unsafe {
                    let element = slot.load(Ordering::Relaxed, epoch::unprotected());
                    if !element.is_null() {
                        drop(element.into_owned());
                    }
                }
            }
        }
    }
}
