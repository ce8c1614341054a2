//! Last in, first out (usually).
//!
//! Items are appended to the right side of a [`Deque`]. Which end they come back off of is up to
//! [`PopEnd`]: the tail gives real stack order and is what [`LifoQueue::new`][crate::queue::Queue::new]
//! sets up. Popping from the head is also available, for interop with producers/consumers that
//! treat this list as push-tail/pop-head; that's FIFO order, whatever the type is called.

use crate::{
    deque::Deque,
    error::Result,
    queue::{Queue, QueueConfig, QueueStorage},
    store::StoreHandle,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A queue that hands back the most recently added item first.
pub type LifoQueue<T> = Queue<LifoStorage<T>>;

/// Which end of the list items are taken from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PopEnd {
    /// The end items are pushed onto: stack order.
    #[default]
    Tail,
    /// The far end: queue order.
    Head,
}

/// Keeps items in a [`Deque`] named after the queue. Items go on the right.
#[derive(Debug)]
pub struct LifoStorage<T> {
    deque: Deque<T>,
    pop_end: PopEnd,
}

impl<T: Serialize + DeserializeOwned> LifoStorage<T> {
    /// Create list storage that pops from the given end.
    pub fn new<N: Into<String>>(name: N, store: StoreHandle, maxlen: usize, pop_end: PopEnd) -> Self {
        Self {
            deque: Deque::new(name, store, maxlen),
            pop_end,
        }
    }

    /// The deque holding our items
    pub fn deque(&self) -> &Deque<T> {
        &self.deque
    }

    /// Which end we pop from
    pub fn pop_end(&self) -> PopEnd {
        self.pop_end
    }
}

impl<T: Serialize + DeserializeOwned> LifoQueue<T> {
    /// Create a handle that pops from a specific end of the list.
    pub fn with_pop_end(config: QueueConfig, store: StoreHandle, pop_end: PopEnd) -> Self {
        let storage = LifoStorage::new(config.name().clone(), store, config.maxsize(), pop_end);
        Self::with_storage(config, storage)
    }
}

impl<T: Serialize + DeserializeOwned> QueueStorage for LifoStorage<T> {
    type Item = T;
    type Entry = T;

    fn init(config: &QueueConfig, store: StoreHandle) -> Result<Self> {
        Ok(Self::new(config.name().clone(), store, config.maxsize(), PopEnd::default()))
    }

    fn size(&self) -> Result<usize> {
        self.deque.len()
    }

    fn put_one(&self, item: T) -> Result<()> {
        self.deque.append(&item)
    }

    fn get_one(&self) -> Result<Option<T>> {
        match self.pop_end {
            PopEnd::Tail => self.deque.pop_right(),
            PopEnd::Head => self.deque.pop_left(),
        }
    }

    /// Items in the order they'd come out.
    fn snapshot(&self) -> Result<Vec<T>> {
        let mut items = self.deque.snapshot()?;
        if self.pop_end == PopEnd::Tail {
            items.reverse();
        }
        Ok(items)
    }

    fn clear(&self) -> Result<()> {
        self.deque.clear()
    }
}
