use core::iter::FusedIterator;

use super::LockFreeVec;

/// Snapshot iterator returned by [`LockFreeVec::iter`].
///
/// Yields clones of indices `0..len`, where `len` is the size observed when
/// the iterator was created. Stops early once an index is no longer valid.
pub struct Iter<'a, T> {
    vec: &'a LockFreeVec<T>,
    index: usize,
    len: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(super) fn new(vec: &'a LockFreeVec<T>, len: usize) -> Self {
        Self { vec, index: 0, len }
    }
}

impl<T: Clone> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.index >= self.len {
            return None;
        }
        match self.vec.get(self.index) {
            Ok(element) => {
                self.index += 1;
                Some(element)
            }
            Err(_) => {
                self.index = self.len;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.len - self.index))
    }
}

impl<T: Clone> FusedIterator for Iter<'_, T> {}

impl<'a, T: Clone> IntoIterator for &'a LockFreeVec<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
