//! # `lockfree-vec` - Lock-Free Growable Vector
//!
//! A concurrent, dynamically growing, indexable sequence that any number of
//! threads may append to, read, overwrite and pop from without a lock.
//!
//! ## Guarantees
//!
//! - **No copying on growth**: storage is a fixed root array of buckets whose
//!   sizes double (`2, 4, 8, ...`). A bucket is allocated once, never moved and
//!   never freed before the vector itself.
//! - **O(1) addressing**: a logical index maps to `(bucket, offset)` with one
//!   leading-zero count (see [`addressing`]).
//! - **Lock-freedom**: appends and pops race on a single descriptor CAS. A
//!   pending slot write can be finished by any thread, so a suspended writer
//!   never stalls the rest. Individual threads may retry under contention; the
//!   structure as a whole always makes progress.
//! - **Total order on size changes**: every `append` / `remove_tail` is
//!   linearized at its successful descriptor CAS.
//!
//! ## Deliberately weak operations
//!
//! - [`LockFreeVec::set`] is a best-effort overwrite outside the descriptor
//!   protocol.
//! - [`LockFreeVec::remove_tail`] ignores its index and always pops the tail.
//!
//! ## Example
//!
//! ```rust
//! use lockfree_vec::LockFreeVec;
//!
//! let vec = LockFreeVec::new();
//! for i in 0..30 {
//!     vec.append(i);
//! }
//! assert_eq!(vec.size(), 30);
//! assert_eq!(vec.get(15), Ok(15));
//! assert!(vec.get(30).is_err());
//!
//! assert_eq!(vec.remove_tail(0), Ok(29));
//! assert_eq!(vec.size(), 29);
//! ```
//!
//! ## Features
//!
//! - `tracing`: emit `trace!` events for bucket allocation and descriptor
//!   contention.

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod addressing;
pub mod error;
pub mod vec;

pub use addressing::ROOT_SIZE;
pub use error::IndexOutOfRange;
pub use vec::{Iter, LockFreeVec};

// Addressing is usable in const contexts.
const _: () = {
    assert!(addressing::bucket_of(29) == 3);
    assert!(addressing::offset_in_bucket(3, 29) == 15);
};
