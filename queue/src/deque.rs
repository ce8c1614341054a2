//! A double-ended sequence whose items live in a [`Store`][crate::store::Store] list rather than
//! in memory. This is what a FIFO queue keeps its items in.

use crate::{
    error::Result,
    ser,
    store::StoreHandle,
};
use getset::{CopyGetters, Getters};
use serde::{de::DeserializeOwned, ser::Serialize};
use std::marker::PhantomData;

/// A remote-backed deque of `T`s, addressed by name.
///
/// The deque holds nothing but its name and a store handle, so any number of them (in any number
/// of processes) can point at the same list.
#[derive(Getters, CopyGetters)]
pub struct Deque<T> {
    /// The store key holding our items
    #[getset(get = "pub")]
    name: String,
    /// The bound this deque was created for (0 is unbounded). It's informational: the deque
    /// itself never evicts anything.
    #[getset(get_copy = "pub")]
    maxlen: usize,
    store: StoreHandle,
    _item: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for Deque<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deque")
            .field("name", &self.name)
            .field("maxlen", &self.maxlen)
            .finish()
    }
}

impl<T: Serialize + DeserializeOwned> Deque<T> {
    /// Create a new deque handle.
    pub fn new<N: Into<String>>(name: N, store: StoreHandle, maxlen: usize) -> Self {
        Self {
            name: name.into(),
            maxlen,
            store,
            _item: PhantomData,
        }
    }

    /// How many items are in the deque right now
    pub fn len(&self) -> Result<usize> {
        self.store.list_len(&self.name)
    }

    /// Whether the deque is empty right now
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Add an item to the right side of the deque.
    pub fn append(&self, item: &T) -> Result<()> {
        self.store.list_push_tail(&self.name, ser::serialize(item)?)
    }

    /// Remove and return the item on the left side of the deque, if there is one.
    pub fn pop_left(&self) -> Result<Option<T>> {
        self.store.list_pop_head(&self.name)?
            .map(|bytes| ser::deserialize(&bytes))
            .transpose()
    }

    /// Remove and return the item on the right side of the deque, if there is one.
    pub fn pop_right(&self) -> Result<Option<T>> {
        self.store.list_pop_tail(&self.name)?
            .map(|bytes| ser::deserialize(&bytes))
            .transpose()
    }

    /// Everything in the deque, left to right.
    pub fn snapshot(&self) -> Result<Vec<T>> {
        self.store.list_range(&self.name, 0, -1)?
            .iter()
            .map(|bytes| ser::deserialize(bytes))
            .collect()
    }

    /// Remove everything.
    pub fn clear(&self) -> Result<()> {
        self.store.clear(&self.name)
    }
}
