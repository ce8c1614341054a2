//! First in, first out. The default kind of queue.

use crate::{
    deque::Deque,
    error::Result,
    queue::{Queue, QueueConfig, QueueStorage},
    store::StoreHandle,
};
use serde::{de::DeserializeOwned, ser::Serialize};

/// A queue that hands items back in the order they went in.
pub type FifoQueue<T> = Queue<FifoStorage<T>>;

/// Keeps items in a [`Deque`] named after the queue: append on the right, pop on the left.
#[derive(Debug)]
pub struct FifoStorage<T> {
    deque: Deque<T>,
}

impl<T: Serialize + DeserializeOwned> FifoStorage<T> {
    /// The deque holding our items
    pub fn deque(&self) -> &Deque<T> {
        &self.deque
    }
}

impl<T: Serialize + DeserializeOwned> QueueStorage for FifoStorage<T> {
    type Item = T;
    type Entry = T;

    fn init(config: &QueueConfig, store: StoreHandle) -> Result<Self> {
        Ok(Self {
            deque: Deque::new(config.name().clone(), store, config.maxsize()),
        })
    }

    fn size(&self) -> Result<usize> {
        self.deque.len()
    }

    fn put_one(&self, item: T) -> Result<()> {
        self.deque.append(&item)
    }

    fn get_one(&self) -> Result<Option<T>> {
        self.deque.pop_left()
    }

    fn snapshot(&self) -> Result<Vec<T>> {
        self.deque.snapshot()
    }

    fn clear(&self) -> Result<()> {
        self.deque.clear()
    }
}
