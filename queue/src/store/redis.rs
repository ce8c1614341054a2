//! A [`Store`] backed by a redis server, which is the shared, networked key space this whole
//! library was designed around. Every primitive is exactly one redis command.
//!
//! Redis scores are doubles, so priorities survive the trip exactly as long as they stay within
//! +/- 2^53.

use crate::{
    error::{Error, Result},
    store::{Scored, Store},
};
use ::redis::{Client, Connection};
use std::sync::{Mutex, MutexGuard};

/// A store that talks to redis over a single connection.
pub struct RedisStore {
    conn: Mutex<Connection>,
}

impl RedisStore {
    /// Connect to the redis server at `url` (ie `redis://127.0.0.1:6379/0`).
    pub fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url)?;
        Ok(Self::new(client.get_connection()?))
    }

    /// Wrap an existing connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock()
            .map_err(|e| Error::StoreLockError(format!("{}", e)))
    }
}

/// Turn redis' double scores back into our integer ones. Anything that isn't a whole number we
/// could have written ourselves means somebody else has been at the key.
fn scored(key: &str, raw: Vec<(Vec<u8>, f64)>) -> Result<Vec<Scored>> {
    raw.into_iter()
        .map(|(member, score)| {
            // i64::MAX rounds up to 2^63 as a double, which is already out of range
            if score.fract() != 0.0 || score < i64::MIN as f64 || score >= i64::MAX as f64 {
                return Err(Error::StoreCorrupt(key.into(), format!("score {} is not an integer priority", score)));
            }
            Ok((member, score as i64))
        })
        .collect()
}

impl Store for RedisStore {
    fn increment(&self, key: &str) -> Result<u128> {
        let val: i64 = ::redis::cmd("INCR").arg(key).query(&mut *self.conn()?)?;
        u128::try_from(val)
            .map_err(|_| Error::StoreCorrupt(key.into(), format!("counter went negative: {}", val)))
    }

    fn list_len(&self, key: &str) -> Result<usize> {
        Ok(::redis::cmd("LLEN").arg(key).query(&mut *self.conn()?)?)
    }

    fn list_push_tail(&self, key: &str, item: Vec<u8>) -> Result<()> {
        let _: usize = ::redis::cmd("RPUSH").arg(key).arg(item).query(&mut *self.conn()?)?;
        Ok(())
    }

    fn list_pop_head(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(::redis::cmd("LPOP").arg(key).query(&mut *self.conn()?)?)
    }

    fn list_pop_tail(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(::redis::cmd("RPOP").arg(key).query(&mut *self.conn()?)?)
    }

    fn list_range(&self, key: &str, start: isize, end: isize) -> Result<Vec<Vec<u8>>> {
        Ok(::redis::cmd("LRANGE").arg(key).arg(start).arg(end).query(&mut *self.conn()?)?)
    }

    fn sorted_len(&self, key: &str) -> Result<usize> {
        Ok(::redis::cmd("ZCARD").arg(key).query(&mut *self.conn()?)?)
    }

    fn sorted_insert(&self, key: &str, member: Vec<u8>, score: i64) -> Result<bool> {
        let added: usize = ::redis::cmd("ZADD").arg(key).arg(score as f64).arg(member).query(&mut *self.conn()?)?;
        Ok(added == 1)
    }

    fn sorted_pop_min(&self, key: &str, count: usize) -> Result<Vec<Scored>> {
        let raw: Vec<(Vec<u8>, f64)> = ::redis::cmd("ZPOPMIN").arg(key).arg(count).query(&mut *self.conn()?)?;
        scored(key, raw)
    }

    fn sorted_range(&self, key: &str, start: isize, end: isize) -> Result<Vec<Scored>> {
        let raw: Vec<(Vec<u8>, f64)> = ::redis::cmd("ZRANGE")
            .arg(key)
            .arg(start)
            .arg(end)
            .arg("WITHSCORES")
            .query(&mut *self.conn()?)?;
        scored(key, raw)
    }

    fn clear(&self, key: &str) -> Result<()> {
        let _: usize = ::redis::cmd("DEL").arg(key).query(&mut *self.conn()?)?;
        Ok(())
    }
}
