//! Store wrappers for poking at the edges of the queues in tests.

use crate::{
    error::{Error, Result},
    store::{MemoryStore, Scored, Store},
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Barrier,
};

/// Take one from `counter` if there's one to take.
fn take_one(counter: &AtomicUsize) -> bool {
    counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok()
}

/// A memory store that, once armed, makes size reads wait for each other. Every armed
/// `list_len`/`sorted_len` reads its value and then blocks until `parties` readers have done the
/// same, which lines racing queue handles up right between their check and their act.
pub struct GatedStore {
    inner: MemoryStore,
    gate: Barrier,
    armed: AtomicUsize,
}

impl GatedStore {
    pub fn new(parties: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            gate: Barrier::new(parties),
            armed: AtomicUsize::new(0),
        }
    }

    /// Gate the next `reads` size reads.
    pub fn arm(&self, reads: usize) {
        self.armed.store(reads, Ordering::SeqCst);
    }

    fn gated<T>(&self, val: Result<T>) -> Result<T> {
        if take_one(&self.armed) {
            self.gate.wait();
        }
        val
    }
}

/// A memory store whose sorted set inserts can be made to fail, the way a dropped connection
/// would.
pub struct FlakyStore {
    inner: MemoryStore,
    failing_inserts: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            failing_inserts: AtomicUsize::new(0),
        }
    }

    /// Fail the next `count` sorted set inserts.
    pub fn fail_inserts(&self, count: usize) {
        self.failing_inserts.store(count, Ordering::SeqCst);
    }
}

macro_rules! delegate_store {
    ($name:ident, { $($overrides:tt)* }) => {
        impl Store for $name {
            $($overrides)*

            fn increment(&self, key: &str) -> Result<u128> {
                self.inner.increment(key)
            }

            fn list_push_tail(&self, key: &str, item: Vec<u8>) -> Result<()> {
                self.inner.list_push_tail(key, item)
            }

            fn list_pop_head(&self, key: &str) -> Result<Option<Vec<u8>>> {
                self.inner.list_pop_head(key)
            }

            fn list_pop_tail(&self, key: &str) -> Result<Option<Vec<u8>>> {
                self.inner.list_pop_tail(key)
            }

            fn list_range(&self, key: &str, start: isize, end: isize) -> Result<Vec<Vec<u8>>> {
                self.inner.list_range(key, start, end)
            }

            fn sorted_pop_min(&self, key: &str, count: usize) -> Result<Vec<Scored>> {
                self.inner.sorted_pop_min(key, count)
            }

            fn sorted_range(&self, key: &str, start: isize, end: isize) -> Result<Vec<Scored>> {
                self.inner.sorted_range(key, start, end)
            }

            fn clear(&self, key: &str) -> Result<()> {
                self.inner.clear(key)
            }
        }
    }
}

delegate_store!(GatedStore, {
    fn list_len(&self, key: &str) -> Result<usize> {
        self.gated(self.inner.list_len(key))
    }

    fn sorted_len(&self, key: &str) -> Result<usize> {
        self.gated(self.inner.sorted_len(key))
    }

    fn sorted_insert(&self, key: &str, member: Vec<u8>, score: i64) -> Result<bool> {
        self.inner.sorted_insert(key, member, score)
    }
});

delegate_store!(FlakyStore, {
    fn list_len(&self, key: &str) -> Result<usize> {
        self.inner.list_len(key)
    }

    fn sorted_len(&self, key: &str) -> Result<usize> {
        self.inner.sorted_len(key)
    }

    fn sorted_insert(&self, key: &str, member: Vec<u8>, score: i64) -> Result<bool> {
        if take_one(&self.failing_inserts) {
            return Err(Error::StoreError(sled::Error::Unsupported("connection dropped".into())));
        }
        self.inner.sorted_insert(key, member, score)
    }
});
