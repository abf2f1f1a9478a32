//! Error type for index-based operations.

use core::fmt;

/// The error returned when an index is not currently valid.
///
/// Raised by [`get`](crate::LockFreeVec::get), [`set`](crate::LockFreeVec::set)
/// and [`remove_tail`](crate::LockFreeVec::remove_tail). `len` is the size
/// observed by the failing bounds check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOutOfRange {
    /// The requested index.
    pub index: usize,
    /// The size observed when the request was rejected.
    pub len: usize,
}

impl IndexOutOfRange {
    pub(crate) const fn new(index: usize, len: usize) -> Self {
        Self { index, len }
    }
}

impl fmt::Display for IndexOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index {} out of range for length {}", self.index, self.len)
    }
}

impl std::error::Error for IndexOutOfRange {}
