//! The queue module is the main interface to the queue system. A [`Queue`] is a thin handle: a
//! name, an optional bound, and a storage strategy that knows how to talk to the store. All the
//! full/empty policy lives here, once, and the storage strategies ([`FifoStorage`],
//! [`PriorityStorage`], [`LifoStorage`]) only supply the raw primitives.
//!
//! Nothing here blocks. `put` on a full queue and `get` on an empty one fail right away with
//! [`Error::Full`]/[`Error::Empty`].
//!
//! The full/empty checks are check-then-act: we read the size, then we act on it, and those are
//! two separate trips to the store. Two producers racing for the last slot can both get in (so the
//! bound can be exceeded), and two consumers racing for the last item can leave one of them with
//! an `Empty` even though the queue looked non-empty a moment ago. That's the deal.
//!
//! [`FifoStorage`]: crate::fifo::FifoStorage
//! [`PriorityStorage`]: crate::priority::PriorityStorage
//! [`LifoStorage`]: crate::lifo::LifoStorage

use crate::{
    error::{Error, Result},
    store::StoreHandle,
};
use derive_builder::Builder;
use getset::{CopyGetters, Getters};
use serde::{Serialize, Deserialize};
use tracing::trace;

/// Describes a queue: what it's called and how big it can get.
#[derive(Clone, Debug, Builder, Getters, CopyGetters, Serialize, Deserialize)]
#[builder(build_fn(error = "crate::error::Error"))]
pub struct QueueConfig {
    /// The queue's name. Every handle using this name sees the same queue.
    #[builder(setter(into))]
    #[getset(get = "pub")]
    name: String,
    /// Max number of items the queue holds. 0 means no limit.
    #[builder(default)]
    #[serde(default)]
    #[getset(get_copy = "pub")]
    maxsize: usize,
}

impl QueueConfig {
    /// Create a config directly.
    pub fn new<N: Into<String>>(name: N, maxsize: usize) -> Self {
        Self { name: name.into(), maxsize }
    }
}

/// The primitives a queue variant needs to provide. [`Queue`] builds the public contract on top
/// of these and never lets callers at them directly.
pub trait QueueStorage {
    /// What goes in and comes out of the queue
    type Item;
    /// What a stored entry looks like when listing the queue
    type Entry;

    /// Set up storage for the queue described by `config`.
    fn init(config: &QueueConfig, store: StoreHandle) -> Result<Self>
        where Self: Sized;

    /// Number of items stored right now
    fn size(&self) -> Result<usize>;

    /// Store one item, unconditionally.
    fn put_one(&self, item: Self::Item) -> Result<()>;

    /// Remove and return the next item, or `None` if there's nothing there.
    fn get_one(&self) -> Result<Option<Self::Item>>;

    /// Every stored entry, in the order they'd come out.
    fn snapshot(&self) -> Result<Vec<Self::Entry>>;

    /// Remove everything.
    fn clear(&self) -> Result<()>;
}

/// A handle to a named, store-backed queue.
///
/// Handles are cheap and hold no queue contents: every call goes to the store, and any number of
/// handles (in any number of processes) can work the same queue at once.
#[derive(Debug, Getters, CopyGetters)]
pub struct Queue<S> {
    /// The queue's name
    #[getset(get = "pub")]
    name: String,
    /// The queue's bound (0 is unbounded)
    #[getset(get_copy = "pub")]
    maxsize: usize,
    /// The storage strategy
    #[getset(get = "pub")]
    storage: S,
}

impl<S: QueueStorage> Queue<S> {
    /// Create a queue handle, letting the storage strategy set itself up however it does by
    /// default.
    pub fn new(config: QueueConfig, store: StoreHandle) -> Result<Self> {
        let storage = S::init(&config, store)?;
        Ok(Self::with_storage(config, storage))
    }

    /// Create a queue handle around storage that's already been set up.
    pub fn with_storage(config: QueueConfig, storage: S) -> Self {
        let QueueConfig { name, maxsize } = config;
        Self { name, maxsize, storage }
    }

    /// How many items are in the queue
    pub fn size(&self) -> Result<usize> {
        self.storage.size()
    }

    /// Alias for [`Queue::size`]
    pub fn qsize(&self) -> Result<usize> {
        self.size()
    }

    /// True if there's nothing in the queue
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.size()? == 0)
    }

    /// True if the queue is bounded and at (or over) its bound
    pub fn is_full(&self) -> Result<bool> {
        Ok(self.maxsize > 0 && self.size()? >= self.maxsize)
    }

    /// Put an item into the queue, failing with [`Error::Full`] if there's no room.
    #[tracing::instrument(skip(self, item), fields(queue = %self.name))]
    pub fn put(&self, item: S::Item) -> Result<()> {
        if self.is_full()? {
            trace!("Queue::put() -- {} is full", self.name);
            return Err(Error::Full);
        }
        self.storage.put_one(item)
    }

    /// Grab the next item from the queue, failing with [`Error::Empty`] if there isn't one.
    #[tracing::instrument(skip(self), fields(queue = %self.name))]
    pub fn get(&self) -> Result<S::Item> {
        if self.is_empty()? {
            trace!("Queue::get() -- {} is empty", self.name);
            return Err(Error::Empty);
        }
        // the queue had something in it a moment ago. if it doesn't now, somebody else got
        // there first.
        self.storage.get_one()?
            .ok_or_else(|| {
                trace!("Queue::get() -- {} emptied out from under us", self.name);
                Error::Empty
            })
    }

    /// Same as [`Queue::put`]. Every put is non-waiting.
    pub fn put_nowait(&self, item: S::Item) -> Result<()> {
        self.put(item)
    }

    /// Same as [`Queue::get`]. Every get is non-waiting.
    pub fn get_nowait(&self) -> Result<S::Item> {
        self.get()
    }

    /// List everything in the queue, in the order it'd come out. Just a point-in-time view.
    pub fn snapshot(&self) -> Result<Vec<S::Entry>> {
        self.storage.snapshot()
    }

    /// Empty the queue out.
    #[tracing::instrument(skip(self), fields(queue = %self.name))]
    pub fn clear(&self) -> Result<()> {
        self.storage.clear()
    }

    /// Not supported: we don't track consumers, so there's nothing to mark done.
    pub fn task_done(&self) -> Result<()> {
        Err(Error::UnsupportedOperation("task_done"))
    }

    /// Not supported: we don't track consumers, so there's nothing to wait on.
    pub fn join(&self) -> Result<()> {
        Err(Error::UnsupportedOperation("join"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fifo::FifoQueue,
        priority::PriorityQueue,
        store::MemoryStore,
        testutil::GatedStore,
        types::Priority,
    };
    use std::sync::Arc;

    fn mem() -> StoreHandle {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn config_builder() {
        let config = QueueConfigBuilder::default()
            .name("jobs")
            .build()
            .unwrap();
        assert_eq!(config.name(), "jobs");
        assert_eq!(config.maxsize(), 0);
        let config = QueueConfigBuilder::default()
            .name("jobs")
            .maxsize(12usize)
            .build()
            .unwrap();
        assert_eq!(config.maxsize(), 12);
        match QueueConfigBuilder::default().maxsize(1usize).build() {
            Err(Error::Config(msg)) => assert!(msg.contains("name")),
            x => panic!("unexpected result: {:?}", x),
        }
    }

    #[test]
    fn size_tracks_puts_and_gets() {
        let queue = FifoQueue::<u32>::new(QueueConfig::new("jobs", 0), mem()).unwrap();
        let mut expected = 0;
        for i in 0..10 {
            queue.put(i).unwrap();
            expected += 1;
            assert_eq!(queue.size().unwrap(), expected);
            if i % 3 == 0 {
                queue.get().unwrap();
                expected -= 1;
                assert_eq!(queue.qsize().unwrap(), expected);
            }
        }
    }

    #[test]
    fn full() {
        let queue = FifoQueue::<u32>::new(QueueConfig::new("jobs", 2), mem()).unwrap();
        assert_eq!(queue.is_full().unwrap(), false);
        queue.put(1).unwrap();
        assert_eq!(queue.is_full().unwrap(), false);
        queue.put(2).unwrap();
        assert_eq!(queue.is_full().unwrap(), true);
        match queue.put(3) {
            Err(Error::Full) => {}
            x => panic!("unexpected result: {:?}", x),
        }
        assert_eq!(queue.size().unwrap(), 2);
        assert_eq!(queue.get().unwrap(), 1);
        assert_eq!(queue.size().unwrap(), 1);
        queue.put_nowait(3).unwrap();
        assert_eq!(queue.snapshot().unwrap(), vec![2, 3]);
    }

    #[test]
    fn unbounded_is_never_full() {
        let queue = FifoQueue::<u32>::new(QueueConfig::new("jobs", 0), mem()).unwrap();
        for i in 0..100 {
            queue.put(i).unwrap();
        }
        assert_eq!(queue.is_full().unwrap(), false);
    }

    #[test]
    fn empty() {
        let queue = FifoQueue::<String>::new(QueueConfig::new("jobs", 0), mem()).unwrap();
        assert_eq!(queue.is_empty().unwrap(), true);
        match queue.get() {
            Err(Error::Empty) => {}
            x => panic!("unexpected result: {:?}", x),
        }
        match queue.get_nowait() {
            Err(Error::Empty) => {}
            x => panic!("unexpected result: {:?}", x),
        }
        assert_eq!(queue.size().unwrap(), 0);
    }

    #[test]
    fn clear_twice() {
        let queue = FifoQueue::<u32>::new(QueueConfig::new("jobs", 0), mem()).unwrap();
        queue.put(1).unwrap();
        queue.put(2).unwrap();
        queue.clear().unwrap();
        assert_eq!(queue.size().unwrap(), 0);
        queue.clear().unwrap();
        assert_eq!(queue.size().unwrap(), 0);
    }

    #[test]
    fn consumer_tracking_fails_loudly() {
        let queue = FifoQueue::<u32>::new(QueueConfig::new("jobs", 0), mem()).unwrap();
        match queue.task_done() {
            Err(Error::UnsupportedOperation(op)) => assert_eq!(op, "task_done"),
            x => panic!("unexpected result: {:?}", x),
        }
        match queue.join() {
            Err(Error::UnsupportedOperation(op)) => assert_eq!(op, "join"),
            x => panic!("unexpected result: {:?}", x),
        }
    }

    #[test]
    fn racing_producers_can_overshoot_bound() {
        // both producers read the size before either one pushes
        let store = Arc::new(GatedStore::new(2));
        let config = QueueConfig::new("jobs", 2);
        let queue = FifoQueue::<u32>::new(config.clone(), store.clone()).unwrap();
        queue.put(0).unwrap();
        store.arm(2);

        let mut handles = Vec::new();
        for i in 1..=2 {
            let queue = FifoQueue::<u32>::new(config.clone(), store.clone()).unwrap();
            handles.push(std::thread::spawn(move || queue.put(i)));
        }
        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(queue.size().unwrap(), 3);
        assert_eq!(queue.is_full().unwrap(), true);
        match queue.put(4) {
            Err(Error::Full) => {}
            x => panic!("unexpected result: {:?}", x),
        }
    }

    #[test]
    fn racing_consumers_can_see_spurious_empty() {
        let store = Arc::new(GatedStore::new(2));
        let config = QueueConfig::new("jobs", 0);
        let queue = FifoQueue::<u32>::new(config.clone(), store.clone()).unwrap();
        queue.put(42).unwrap();
        store.arm(2);

        let mut handles = Vec::new();
        for _ in 0..2 {
            let queue = FifoQueue::<u32>::new(config.clone(), store.clone()).unwrap();
            handles.push(std::thread::spawn(move || queue.get()));
        }
        let results = handles.into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>();
        let got = results.iter().filter_map(|r| r.as_ref().ok()).collect::<Vec<_>>();
        let empties = results.iter().filter(|r| matches!(r, Err(Error::Empty))).count();
        assert_eq!(got, vec![&42]);
        assert_eq!(empties, 1);
        assert_eq!(queue.size().unwrap(), 0);
    }

    #[test]
    fn racing_priority_consumers_can_see_spurious_empty() {
        let store = Arc::new(GatedStore::new(2));
        let config = QueueConfig::new("pri", 0);
        let queue = PriorityQueue::<String>::new(config.clone(), store.clone()).unwrap();
        queue.put((Priority::from(1), "only".into())).unwrap();
        store.arm(2);

        let mut handles = Vec::new();
        for _ in 0..2 {
            let queue = PriorityQueue::<String>::new(config.clone(), store.clone()).unwrap();
            handles.push(std::thread::spawn(move || queue.get()));
        }
        let results = handles.into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(results.iter().filter(|r| matches!(r, Err(Error::Empty))).count(), 1);
    }
}
