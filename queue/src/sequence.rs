//! Sources of tie-break values for priority queues.
//!
//! A sorted set needs every member to be unique, but two priority queue entries can easily be
//! identical. Each entry gets a [`Sequence`] glued onto it, pulled from a [`SequenceSource`],
//! which makes it unique and pins its place among entries of equal priority.

use crate::{
    error::Result,
    store::StoreHandle,
    types::Sequence,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Hands out strictly increasing, never repeated [`Sequence`] values.
pub trait SequenceSource: Send + Sync {
    /// Grab the next value.
    fn next(&self) -> Result<Sequence>;
}

/// A [`SequenceSource`] that knows how to set itself up for a given queue, which lets
/// [`Queue::new`][crate::queue::Queue::new] build priority queues around it.
pub trait QueueCounter: SequenceSource + Sized {
    /// Create the source for the queue named `queue_name`.
    fn for_queue(store: &StoreHandle, queue_name: &str) -> Self;
}

/// A counter that lives in the store, next to the queue it serves. Every handle for the same
/// queue name shares it, across processes.
pub struct StoreCounter {
    key: String,
    store: StoreHandle,
}

impl StoreCounter {
    /// Create a counter for the queue named `queue_name`.
    pub fn new<N: AsRef<str>>(store: StoreHandle, queue_name: N) -> Self {
        Self {
            key: format!("{}:counter", queue_name.as_ref()),
            store,
        }
    }

    /// The key this counter is kept under
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for StoreCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCounter").field("key", &self.key).finish()
    }
}

impl QueueCounter for StoreCounter {
    fn for_queue(store: &StoreHandle, queue_name: &str) -> Self {
        Self::new(store.clone(), queue_name)
    }
}

impl SequenceSource for StoreCounter {
    fn next(&self) -> Result<Sequence> {
        let val = self.store.increment(&self.key)?;
        trace!("StoreCounter::next() -- {} -> {}", self.key, val);
        Ok(Sequence::from(val))
    }
}

/// An in-process counter. Only unique within this process, so it's really only good for tests or
/// for a store nobody else is sharing.
#[derive(Debug)]
pub struct LocalCounter {
    next_id: AtomicU64,
}

impl LocalCounter {
    /// Create a counter whose first value is 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Create a counter whose first value is `start`.
    pub fn starting_at(start: u64) -> Self {
        Self { next_id: AtomicU64::new(start) }
    }
}

impl Default for LocalCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueCounter for LocalCounter {
    fn for_queue(_store: &StoreHandle, _queue_name: &str) -> Self {
        Self::new()
    }
}

impl SequenceSource for LocalCounter {
    fn next(&self) -> Result<Sequence> {
        Ok(Sequence::from(self.next_id.fetch_add(1, Ordering::SeqCst) as u128))
    }
}
