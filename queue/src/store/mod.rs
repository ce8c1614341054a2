//! This module allows interfacing with the storage system.
//!
//! A [`Store`] is a shared key space offering a handful of atomic primitives: list push/pop,
//! sorted set insert/pop-minimum, and counter increment. Every call is one round trip and is
//! atomic on its own. Nothing built on top of a `Store` gets atomicity across calls.

pub mod disk;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

use crate::{
    error::Result,
};
use std::sync::Arc;

pub use disk::SledStore;
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

/// A shareable handle to a store. Queue handles clone this around freely.
pub type StoreHandle = Arc<dyn Store>;

/// A sorted set member along with its score.
pub type Scored = (Vec<u8>, i64);

/// The `Store` trait defines an interface for our storage systems.
pub trait Store: Send + Sync {
    /// Increment the counter at `key`, returning the value *after* the increment. Missing
    /// counters start at 0.
    fn increment(&self, key: &str) -> Result<u128>;

    /// Number of items in the list at `key`.
    fn list_len(&self, key: &str) -> Result<usize>;

    /// Push an item onto the tail of the list at `key`.
    fn list_push_tail(&self, key: &str, item: Vec<u8>) -> Result<()>;

    /// Pop the item at the head of the list at `key`.
    fn list_pop_head(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Pop the item at the tail of the list at `key`.
    fn list_pop_tail(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Grab items `start..=end` from the list at `key`, head first. Negative indexes count from
    /// the tail (`-1` is the last item).
    fn list_range(&self, key: &str, start: isize, end: isize) -> Result<Vec<Vec<u8>>>;

    /// Number of members in the sorted set at `key`.
    fn sorted_len(&self, key: &str) -> Result<usize>;

    /// Add `member` to the sorted set at `key` with the given score. Returns `true` if the member
    /// is new; an existing member just gets its score replaced.
    fn sorted_insert(&self, key: &str, member: Vec<u8>, score: i64) -> Result<bool>;

    /// Remove and return up to `count` members with the lowest scores. Ties on score are broken by
    /// comparing member bytes.
    fn sorted_pop_min(&self, key: &str, count: usize) -> Result<Vec<Scored>>;

    /// Grab members `start..=end` (in score order) from the sorted set at `key`, with scores.
    /// Indexes work like [`Store::list_range`].
    fn sorted_range(&self, key: &str, start: isize, end: isize) -> Result<Vec<Scored>>;

    /// Remove whatever is stored at `key`. Clearing a missing key is fine.
    fn clear(&self, key: &str) -> Result<()>;

    /// Make sure everything written so far is durable. Stores that write through don't need to
    /// do anything.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Turn an inclusive, possibly-negative `start..=end` into a plain `(skip, take)` pair for a
/// collection of `len` items. Out of range requests come back as `None`.
pub(crate) fn resolve_range(len: usize, start: isize, end: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let end = if end < 0 { len + end } else { end.min(len - 1) };
    if len == 0 || start > end || start >= len {
        return None;
    }
    Some((start as usize, (end - start + 1) as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges() {
        assert_eq!(resolve_range(5, 0, -1), Some((0, 5)));
        assert_eq!(resolve_range(5, 1, 2), Some((1, 2)));
        assert_eq!(resolve_range(5, -2, -1), Some((3, 2)));
        assert_eq!(resolve_range(5, -100, 100), Some((0, 5)));
        assert_eq!(resolve_range(5, 3, 1), None);
        assert_eq!(resolve_range(5, 5, 10), None);
        assert_eq!(resolve_range(0, 0, -1), None);
    }
}
