//! This module holds our in-memory storage interface.
//!
//! It's a stand-in for a real shared store: every primitive holds the key's shard lock for its
//! whole duration, so each one is atomic just like its remote counterpart. It's what the unit
//! tests run against.

use ahash::RandomState;
use crate::{
    error::{Error, Result},
    store::{resolve_range, Scored, Store},
};
use dashmap::DashMap;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// A sorted set: members ordered by `(score, member)` plus a member -> score index so we can
/// keep members unique.
#[derive(Debug, Default)]
struct SortedSet {
    ordered: BTreeSet<(i64, Vec<u8>)>,
    scores: HashMap<Vec<u8>, i64, RandomState>,
}

/// Whatever can live at a key.
#[derive(Debug)]
enum Value {
    Counter(u128),
    List(VecDeque<Vec<u8>>),
    Sorted(SortedSet),
}

impl Value {
    /// Empty lists and sets count as missing keys, so the key is free to hold something else.
    fn is_empty(&self) -> bool {
        match self {
            Self::Counter(_) => false,
            Self::List(list) => list.is_empty(),
            Self::Sorted(set) => set.ordered.is_empty(),
        }
    }
}

/// A storage layer that lives entirely in-memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: DashMap<String, Value, RandomState>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            data: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Run `op` against the list at `key`, creating it if needed.
    fn with_list<F, R>(&self, key: &str, op: F) -> Result<R>
        where F: FnOnce(&mut VecDeque<Vec<u8>>) -> R,
    {
        let mut entry = self.data.entry(key.into()).or_insert_with(|| Value::List(VecDeque::new()));
        if entry.is_empty() {
            *entry = Value::List(VecDeque::new());
        }
        match entry.value_mut() {
            Value::List(list) => Ok(op(list)),
            _ => Err(Error::StoreWrongType(key.into())),
        }
    }

    /// Run `op` against the sorted set at `key`, creating it if needed.
    fn with_sorted<F, R>(&self, key: &str, op: F) -> Result<R>
        where F: FnOnce(&mut SortedSet) -> R,
    {
        let mut entry = self.data.entry(key.into()).or_insert_with(|| Value::Sorted(SortedSet::default()));
        if entry.is_empty() {
            *entry = Value::Sorted(SortedSet::default());
        }
        match entry.value_mut() {
            Value::Sorted(set) => Ok(op(set)),
            _ => Err(Error::StoreWrongType(key.into())),
        }
    }

    /// Drop `key` if it's an empty list or set. The check happens under the key's lock, so a push
    /// that sneaks in first keeps the key alive.
    fn prune(&self, key: &str) {
        self.data.remove_if(key, |_, val| val.is_empty());
    }

    /// Read-only version of the above. Missing keys read as empty without being created.
    fn read<F, R>(&self, key: &str, missing: R, op: F) -> Result<R>
        where F: FnOnce(&Value) -> Option<R>,
    {
        match self.data.get(key) {
            Some(val) if val.is_empty() => Ok(missing),
            Some(val) => op(val.value()).ok_or_else(|| Error::StoreWrongType(key.into())),
            None => Ok(missing),
        }
    }
}

impl Store for MemoryStore {
    fn increment(&self, key: &str) -> Result<u128> {
        let mut entry = self.data.entry(key.into()).or_insert(Value::Counter(0));
        if entry.is_empty() {
            *entry = Value::Counter(0);
        }
        match entry.value_mut() {
            Value::Counter(count) => {
                *count += 1;
                Ok(*count)
            }
            _ => Err(Error::StoreWrongType(key.into())),
        }
    }

    fn list_len(&self, key: &str) -> Result<usize> {
        self.read(key, 0, |val| match val {
            Value::List(list) => Some(list.len()),
            _ => None,
        })
    }

    fn list_push_tail(&self, key: &str, item: Vec<u8>) -> Result<()> {
        self.with_list(key, |list| list.push_back(item))
    }

    fn list_pop_head(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if !self.data.contains_key(key) {
            return Ok(None);
        }
        let popped = self.with_list(key, |list| list.pop_front())?;
        self.prune(key);
        Ok(popped)
    }

    fn list_pop_tail(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if !self.data.contains_key(key) {
            return Ok(None);
        }
        let popped = self.with_list(key, |list| list.pop_back())?;
        self.prune(key);
        Ok(popped)
    }

    fn list_range(&self, key: &str, start: isize, end: isize) -> Result<Vec<Vec<u8>>> {
        self.read(key, Vec::new(), |val| match val {
            Value::List(list) => {
                let items = resolve_range(list.len(), start, end)
                    .map(|(skip, take)| list.iter().skip(skip).take(take).cloned().collect())
                    .unwrap_or_default();
                Some(items)
            }
            _ => None,
        })
    }

    fn sorted_len(&self, key: &str) -> Result<usize> {
        self.read(key, 0, |val| match val {
            Value::Sorted(set) => Some(set.ordered.len()),
            _ => None,
        })
    }

    fn sorted_insert(&self, key: &str, member: Vec<u8>, score: i64) -> Result<bool> {
        self.with_sorted(key, |set| {
            let previous = set.scores.insert(member.clone(), score);
            if let Some(old_score) = previous {
                set.ordered.remove(&(old_score, member.clone()));
            }
            set.ordered.insert((score, member));
            previous.is_none()
        })
    }

    fn sorted_pop_min(&self, key: &str, count: usize) -> Result<Vec<Scored>> {
        if !self.data.contains_key(key) {
            return Ok(Vec::new());
        }
        let popped = self.with_sorted(key, |set| {
            let mut popped = Vec::with_capacity(count.min(set.ordered.len()));
            while popped.len() < count {
                match set.ordered.pop_first() {
                    Some((score, member)) => {
                        set.scores.remove(&member);
                        popped.push((member, score));
                    }
                    None => break,
                }
            }
            popped
        })?;
        self.prune(key);
        Ok(popped)
    }

    fn sorted_range(&self, key: &str, start: isize, end: isize) -> Result<Vec<Scored>> {
        self.read(key, Vec::new(), |val| match val {
            Value::Sorted(set) => {
                let members = resolve_range(set.ordered.len(), start, end)
                    .map(|(skip, take)| {
                        set.ordered.iter()
                            .skip(skip)
                            .take(take)
                            .map(|(score, member)| (member.clone(), *score))
                            .collect()
                    })
                    .unwrap_or_default();
                Some(members)
            }
            _ => None,
        })
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.data.remove(key);
        Ok(())
    }
}
