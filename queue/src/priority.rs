//! Priority queues, kept in a store's sorted set.
//!
//! Items go in as `(priority, value)` pairs and come out lowest priority first. A sorted set
//! won't hold two identical members, and nothing stops a caller from putting the same pair twice,
//! so every member is really `(sequence, value)` where the sequence comes from a counter shared
//! by everyone using the queue. The priority is the member's score.
//!
//! Putting an item is two trips to the store: bump the counter, then insert. If we die (or the
//! store does) in between, a sequence value gets burned and nothing is inserted. That leaves a gap
//! in the sequence but never a duplicate.

use crate::{
    error::Result,
    queue::{Queue, QueueConfig, QueueStorage},
    sequence::{QueueCounter, SequenceSource, StoreCounter},
    ser,
    store::StoreHandle,
    types::{Priority, Ranked},
};
use serde::{de::DeserializeOwned, ser::Serialize};
use std::marker::PhantomData;
use tracing::trace;

/// A queue that hands back the lowest-priority item first, oldest first among equals.
pub type PriorityQueue<T, C = StoreCounter> = Queue<PriorityStorage<T, C>>;

/// Keeps items in a sorted set named after the queue, with tie-breaks from a [`SequenceSource`].
pub struct PriorityStorage<T, C = StoreCounter> {
    name: String,
    store: StoreHandle,
    counter: C,
    _item: PhantomData<fn() -> T>,
}

impl<T, C: std::fmt::Debug> std::fmt::Debug for PriorityStorage<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityStorage")
            .field("name", &self.name)
            .field("counter", &self.counter)
            .finish()
    }
}

impl<T, C> PriorityStorage<T, C>
    where T: Serialize + DeserializeOwned,
          C: SequenceSource,
{
    /// Create priority storage with whatever tie-break source you like. Everybody using the same
    /// queue name needs to be pulling from the same source.
    pub fn with_source<N: Into<String>>(name: N, store: StoreHandle, counter: C) -> Self {
        Self {
            name: name.into(),
            store,
            counter,
            _item: PhantomData,
        }
    }

    /// Our tie-break source
    pub fn counter(&self) -> &C {
        &self.counter
    }

    fn decode(&self, member: &[u8], score: i64) -> Result<Ranked<T>> {
        let (seq, value) = ser::decode_member(&self.name, member)?;
        Ok(Ranked { priority: Priority::from(score), seq, value })
    }
}

impl<T, C> QueueStorage for PriorityStorage<T, C>
    where T: Serialize + DeserializeOwned,
          C: QueueCounter,
{
    type Item = (Priority, T);
    type Entry = Ranked<T>;

    fn init(config: &QueueConfig, store: StoreHandle) -> Result<Self> {
        let counter = C::for_queue(&store, config.name());
        Ok(Self::with_source(config.name().clone(), store, counter))
    }

    fn size(&self) -> Result<usize> {
        self.store.sorted_len(&self.name)
    }

    fn put_one(&self, item: (Priority, T)) -> Result<()> {
        let (priority, value) = item;
        let seq = self.counter.next()?;
        let member = ser::encode_member(seq, &value)?;
        trace!("PriorityStorage::put_one() -- {} seq {} priority {}", self.name, seq, priority);
        self.store.sorted_insert(&self.name, member, *priority)?;
        Ok(())
    }

    fn get_one(&self) -> Result<Option<(Priority, T)>> {
        self.store.sorted_pop_min(&self.name, 1)?
            .into_iter()
            .next()
            .map(|(member, score)| self.decode(&member, score).map(|ranked| ranked.into()))
            .transpose()
    }

    fn snapshot(&self) -> Result<Vec<Ranked<T>>> {
        self.store.sorted_range(&self.name, 0, -1)?
            .iter()
            .map(|(member, score)| self.decode(member, *score))
            .collect()
    }

    fn clear(&self) -> Result<()> {
        // the counter stays put so sequence values are never handed out twice
        self.store.clear(&self.name)
    }
}
