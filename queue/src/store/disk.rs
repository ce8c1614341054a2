//! A persistent store on top of [sled].
//!
//! Each list and sorted set gets its own sled tree, named after its key:
//!
//! - lists live in `list:<key>`, keyed by ids from [`sled::Db::generate_id`] (which only ever go
//!   up), so `pop_min`/`pop_max` give us atomic head/tail pops.
//! - sorted sets live in `zset:<key>`, keyed by `score ++ member` with an empty value, plus a
//!   `zidx:<key>` index of member -> score that keeps members unique. The two are only ever
//!   touched together inside a sled transaction.
//! - counters all live in one `counters` tree and are bumped with `compare_and_swap`.
//!
//! Any number of queue handles in the process can share one `SledStore`.

use crate::{
    error::{Error, Result},
    store::{resolve_range, Scored, Store},
};
use sled::{
    transaction::{ConflictableTransactionError, ConflictableTransactionResult, TransactionError, Transactional},
    Db, Tree,
};
use tracing::trace;

/// Flip the sign bit so that big-endian bytes of an `i64` sort the same way the numbers do.
fn score_to_bytes(score: i64) -> [u8; 8] {
    ((score as u64) ^ (1 << 63)).to_be_bytes()
}

fn score_from_bytes(bytes: [u8; 8]) -> i64 {
    (u64::from_be_bytes(bytes) ^ (1 << 63)) as i64
}

/// Build the key we store a sorted set member under in the score tree.
fn zset_key(score: i64, member: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + member.len());
    key.extend_from_slice(&score_to_bytes(score));
    key.extend_from_slice(member);
    key
}

/// Split a score tree key back up into `(member, score)`.
fn split_zset_key(key: &str, raw: &[u8]) -> Result<Scored> {
    if raw.len() < 8 {
        return Err(Error::StoreCorrupt(key.into(), format!("sorted set entry too short ({} bytes)", raw.len())));
    }
    let (score, member) = raw.split_at(8);
    let mut score_bytes = [0u8; 8];
    score_bytes.copy_from_slice(score);
    Ok((Vec::from(member), score_from_bytes(score_bytes)))
}

/// Decode a stored counter value.
fn counter_value(key: &str, raw: &[u8]) -> Result<u128> {
    let bytes: [u8; 16] = raw.try_into()
        .map_err(|_| Error::StoreCorrupt(key.into(), format!("counter is {} bytes", raw.len())))?;
    Ok(u128::from_be_bytes(bytes))
}

/// Unwrap a sled transaction result into our error type.
fn transaction_result<T>(key: &str, res: std::result::Result<T, TransactionError<String>>) -> Result<T> {
    res.map_err(|e| match e {
        TransactionError::Storage(e) => Error::StoreError(e),
        TransactionError::Abort(msg) => Error::StoreCorrupt(key.into(), msg),
    })
}

/// A [`Store`] that lives in a sled database.
#[derive(Clone, Debug)]
pub struct SledStore {
    db: Db,
    counters: Tree,
}

impl SledStore {
    /// Create a new `SledStore` from a [`sled::Db`] object.
    pub fn new(db: Db) -> Result<Self> {
        let counters = db.open_tree("counters")?;
        Ok(Self { db, counters })
    }

    /// Open (or create) a database at the given path.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let db = sled::Config::default()
            .mode(sled::Mode::HighThroughput)
            .path(path)
            .open()?;
        Self::new(db)
    }

    /// A throwaway database that is removed when dropped. Handy for tests.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::default()
            .mode(sled::Mode::HighThroughput)
            .temporary(true)
            .open()?;
        Self::new(db)
    }

    fn list(&self, key: &str) -> Result<Tree> {
        Ok(self.db.open_tree(format!("list:{}", key))?)
    }

    fn zset(&self, key: &str) -> Result<(Tree, Tree)> {
        let scores = self.db.open_tree(format!("zset:{}", key))?;
        let index = self.db.open_tree(format!("zidx:{}", key))?;
        Ok((scores, index))
    }
}

impl Store for SledStore {
    fn increment(&self, key: &str) -> Result<u128> {
        loop {
            let old = self.counters.get(key)?;
            let current = match old.as_ref() {
                Some(raw) => counter_value(key, raw.as_ref())?,
                None => 0,
            };
            let next = current.checked_add(1)
                .ok_or_else(|| Error::StoreCorrupt(key.into(), "counter overflowed".into()))?;
            let swapped = self.counters.compare_and_swap(key, old.as_ref(), Some(next.to_be_bytes().to_vec()))?;
            match swapped {
                Ok(()) => return Ok(next),
                Err(_) => trace!("SledStore::increment() -- lost race for {}", key),
            }
        }
    }

    fn list_len(&self, key: &str) -> Result<usize> {
        Ok(self.list(key)?.len())
    }

    fn list_push_tail(&self, key: &str, item: Vec<u8>) -> Result<()> {
        let id = self.db.generate_id()?;
        self.list(key)?.insert(id.to_be_bytes(), item)?;
        Ok(())
    }

    fn list_pop_head(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.list(key)?.pop_min()?.map(|(_, val)| val.to_vec()))
    }

    fn list_pop_tail(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.list(key)?.pop_max()?.map(|(_, val)| val.to_vec()))
    }

    fn list_range(&self, key: &str, start: isize, end: isize) -> Result<Vec<Vec<u8>>> {
        let list = self.list(key)?;
        let (skip, take) = match resolve_range(list.len(), start, end) {
            Some(x) => x,
            None => return Ok(Vec::new()),
        };
        list.iter()
            .values()
            .skip(skip)
            .take(take)
            .map(|val| -> Result<Vec<u8>> { Ok(val?.to_vec()) })
            .collect()
    }

    fn sorted_len(&self, key: &str) -> Result<usize> {
        let (_, index) = self.zset(key)?;
        Ok(index.len())
    }

    fn sorted_insert(&self, key: &str, member: Vec<u8>, score: i64) -> Result<bool> {
        let (scores, index) = self.zset(key)?;
        let res = (&scores, &index).transaction(|(scores, index)| -> ConflictableTransactionResult<bool, String> {
            let previous = index.insert(member.as_slice(), &score_to_bytes(score)[..])?;
            if let Some(old) = previous.as_ref() {
                let old_score = <[u8; 8]>::try_from(&old[..])
                    .map_err(|_| ConflictableTransactionError::Abort(format!("bad score for member ({} bytes)", old.len())))?;
                scores.remove(zset_key(score_from_bytes(old_score), &member))?;
            }
            scores.insert(zset_key(score, &member), Vec::new())?;
            Ok(previous.is_none())
        });
        transaction_result(key, res)
    }

    fn sorted_pop_min(&self, key: &str, count: usize) -> Result<Vec<Scored>> {
        let (scores, index) = self.zset(key)?;
        let mut popped = Vec::with_capacity(count.min(index.len()));
        while popped.len() < count {
            let raw = match scores.first()? {
                Some((raw, _)) => raw,
                None => break,
            };
            let (member, score) = split_zset_key(key, raw.as_ref())?;
            let res = (&scores, &index).transaction(|(scores, index)| -> ConflictableTransactionResult<bool, String> {
                match scores.remove(raw.clone())? {
                    Some(_) => {
                        index.remove(member.as_slice())?;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            });
            if transaction_result(key, res)? {
                popped.push((member, score));
            } else {
                // somebody else got to this one first. go around again.
                trace!("SledStore::sorted_pop_min() -- lost race for lowest member of {}", key);
            }
        }
        Ok(popped)
    }

    fn sorted_range(&self, key: &str, start: isize, end: isize) -> Result<Vec<Scored>> {
        let (scores, _) = self.zset(key)?;
        let (skip, take) = match resolve_range(scores.len(), start, end) {
            Some(x) => x,
            None => return Ok(Vec::new()),
        };
        scores.iter()
            .keys()
            .skip(skip)
            .take(take)
            .map(|raw| -> Result<Scored> { split_zset_key(key, raw?.as_ref()) })
            .collect()
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.list(key)?.clear()?;
        let (scores, index) = self.zset(key)?;
        scores.clear()?;
        index.clear()?;
        self.counters.remove(key)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let bytes = self.db.flush()?;
        trace!("SledStore::flush() -- flushed {} bytes", bytes);
        Ok(())
    }
}
