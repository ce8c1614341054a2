//! Small value types shared between the queues and their storage.

use serde::{Serialize, Deserialize};
use std::ops::Deref;

macro_rules! wrapper_primitive {
    ($(#[$attr:meta])* $name:ident, $ty:ty) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name($ty);

        impl From<$ty> for $name {
            fn from(val: $ty) -> Self {
                Self(val)
            }
        }

        impl From<$name> for Vec<u8> {
            fn from(val: $name) -> Vec<u8> {
                Vec::from(val.0.to_be_bytes().as_slice())
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = String;

            fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
                let arr = bytes.try_into()
                    .map_err(|_| format!("expected {} bytes for {}, got {}", std::mem::size_of::<$ty>(), stringify!($name), bytes.len()))?;
                Ok(Self(<$ty>::from_be_bytes(arr)))
            }
        }

        impl Deref for $name {
            type Target = $ty;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    }
}

wrapper_primitive! {
    /// Holds a priority value. Lower priorities come out of a priority queue first.
    Priority, i64
}

wrapper_primitive! {
    /// A tie-break value handed out by a [`SequenceSource`][crate::sequence::SequenceSource].
    /// Strictly increasing per queue name, never reused.
    Sequence, u128
}

/// One stored entry of a priority queue, as it sits in the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ranked<T> {
    /// The score this entry is sorted by
    pub priority: Priority,
    /// The tie-break that keeps this entry unique
    pub seq: Sequence,
    /// The caller's value
    pub value: T,
}

impl<T> From<Ranked<T>> for (Priority, T) {
    fn from(ranked: Ranked<T>) -> Self {
        (ranked.priority, ranked.value)
    }
}
