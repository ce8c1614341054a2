//! The main error enum for the project lives here, and documents the various
//! conditions that can arise while interacting with a queue or its store.

use thiserror::Error;

/// This is our error enum. It contains an entry for any part of the system in
/// which an expectation is not met or a problem occurs.
///
/// [`Error::Full`] and [`Error::Empty`] are the expected, recoverable outcomes of a
/// non-waiting `put`/`get`. Anything coming out of the storage layer is passed through
/// untouched: no retries, no reconnects.
#[derive(Error, Debug)]
pub enum Error {
    /// The queue's bound was already reached when we checked.
    #[error("Queue is full")]
    Full,

    /// No item was available when we checked (or when we went to grab it).
    #[error("Queue is empty")]
    Empty,

    /// Consumer tracking (`task_done`/`join`) isn't something we do.
    #[error("Operation not supported: {0}")]
    UnsupportedOperation(&'static str),

    /// A queue config couldn't be built
    #[error("Invalid queue config: {0}")]
    Config(String),

    /// Error serializing an object
    #[error("Error serializing")]
    Serde(#[from] bincode::Error),

    /// Error in the sled storage layer
    #[error("Error in storage layer {0}")]
    StoreError(#[from] sled::Error),

    /// Error talking to redis
    #[cfg(feature = "redis")]
    #[error("Error in redis storage layer {0}")]
    RedisError(#[from] redis::RedisError),

    /// A key was used as the wrong kind of value (list vs sorted set vs counter)
    #[error("Wrong kind of value held at key: {0}")]
    StoreWrongType(String),

    /// Data in the store didn't look the way we wrote it
    #[error("Malformed data in store at key {0}: {1}")]
    StoreCorrupt(String, String),

    /// Error locking a store connection
    #[error("Error locking store connection: {0}")]
    StoreLockError(String),
}

impl Error {
    /// True if this error came out of the storage layer rather than out of the queue's own
    /// full/empty/unsupported policy.
    pub fn is_store_error(&self) -> bool {
        match self {
            Self::Full | Self::Empty | Self::UnsupportedOperation(..) | Self::Config(..) | Self::Serde(..) => false,
            _ => true,
        }
    }
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Wraps `std::result::Result` around our `Error` enum
pub type Result<T> = std::result::Result<T, Error>;
