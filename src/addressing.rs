//! Logical-index to `(bucket, offset)` addressing.
//!
//! Bucket `k` holds `2^(k+1)` slots and starts at logical index `2^(k+1) - 2`:
//!
//! ```text
//! bucket 0: [0][1]
//! bucket 1: [2][3][4][5]
//! bucket 2: [6][7][8][9][10][11][12][13]
//! ...
//! ```
//!
//! Growth never moves an element, and every lookup is a leading-zero count
//! plus a subtraction. All functions here are pure and allocation-free.

/// Number of bucket references in the root array.
pub const ROOT_SIZE: usize = 64;

/// Largest length addressable with `usize` indices (bucket 62 full).
pub const MAX_LEN: usize = usize::MAX - 1;

/// Highest bucket id reachable from a `usize` index.
pub const MAX_BUCKET: usize = (usize::BITS - 2) as usize;

// Every reachable bucket must fit in the root array.
const _: () = assert!(MAX_BUCKET < ROOT_SIZE);

/// Returns the bucket holding logical `index`.
///
/// This is `USED_BITS(index + 2) - 2`.
///
/// # Panics
/// Panics if `index >= MAX_LEN`.
#[inline]
pub const fn bucket_of(index: usize) -> usize {
    assert!(index < MAX_LEN, "index is beyond the addressable range");
    let used_bits = usize::BITS - (index + 2).leading_zeros();
    (used_bits - 2) as usize
}

/// Number of slots in `bucket`.
#[inline]
pub const fn bucket_len(bucket: usize) -> usize {
    2 << bucket
}

/// First logical index stored in `bucket`.
#[inline]
pub const fn first_index(bucket: usize) -> usize {
    bucket_len(bucket) - 2
}

/// Returns the position of `index` inside `bucket`.
///
/// # Panics
/// Panics if `index` does not belong to `bucket`. A mismatched pair is an
/// addressing bug, never a caller input error.
#[inline]
pub const fn offset_in_bucket(bucket: usize, index: usize) -> usize {
    let first = first_index(bucket);
    assert!(index >= first, "index lies below the bucket");
    // Last index is 2^(bucket+2) - 3, written so that bucket 62 does not overflow.
    assert!(index - first < bucket_len(bucket), "index lies above the bucket");
    index - first
}

/// Resolves `index` to its `(bucket, offset)` pair.
#[inline]
pub const fn locate(index: usize) -> (usize, usize) {
    let bucket = bucket_of(index);
    (bucket, offset_in_bucket(bucket, index))
}
