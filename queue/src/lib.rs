//! The queue library gives you queues (FIFO, LIFO, and priority) whose items live in a shared,
//! persistent key space instead of in process memory. Any number of handles, in any number of
//! processes, can work the same named queue at once. The store is the only point of
//! coordination: handles hold no locks and cache nothing.
//!
//! Everything here is synchronous and nothing ever waits. `put` on a full queue and `get` on an
//! empty one fail right away. The full/empty checks are best-effort (see [`queue`] for why).
//!
//! This library does not track consumers. There is no "mark done" and no "wait until drained";
//! calling either fails with [`error::Error::UnsupportedOperation`].

pub mod deque;
pub mod error;
pub mod fifo;
pub mod lifo;
pub mod priority;
pub mod queue;
pub mod sequence;
pub mod store;
pub mod types;
mod ser;
#[cfg(test)]
mod testutil;

pub use sled;

pub use crate::{
    error::{Error, Result},
    fifo::FifoQueue,
    lifo::{LifoQueue, PopEnd},
    priority::PriorityQueue,
    queue::{Queue, QueueConfig, QueueConfigBuilder},
    store::{MemoryStore, SledStore, Store, StoreHandle},
    types::{Priority, Ranked, Sequence},
};
