use bincode::Options;
use crate::{
    error::{Error, Result},
    types::Sequence,
};
use serde::{
    de::DeserializeOwned,
    ser::Serialize,
};

/// How many bytes a [`Sequence`] takes up at the front of a priority member.
const SEQUENCE_LEN: usize = 16;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        // big endian makes integer values sort properly as raw bytes
        .with_big_endian()
        // fixed length encoding makes integer values sort properly as raw bytes
        .with_fixint_encoding()
}

/// Serialize a value into a byte vector
pub(crate) fn serialize<T: Serialize>(val: &T) -> Result<Vec<u8>> {
    options()
        .serialize(val)
        .map_err(|e| Error::Serde(e))
}

/// Deserialize a value from a byte vector
pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    options()
        .deserialize(bytes)
        .map_err(|e| Error::Serde(e))
}

/// Build a sorted set member out of a tie-break and a value.
///
/// The sequence goes first so that two members with the same score sort by insertion order,
/// no matter what the value bytes look like.
pub(crate) fn encode_member<T: Serialize>(seq: Sequence, val: &T) -> Result<Vec<u8>> {
    let mut member = Vec::from(seq);
    member.extend(serialize(val)?);
    Ok(member)
}

/// Split a sorted set member back into its tie-break and value.
pub(crate) fn decode_member<T: DeserializeOwned>(key: &str, member: &[u8]) -> Result<(Sequence, T)> {
    if member.len() < SEQUENCE_LEN {
        return Err(Error::StoreCorrupt(key.into(), format!("priority member too short ({} bytes)", member.len())));
    }
    let (seq_bytes, val_bytes) = member.split_at(SEQUENCE_LEN);
    let seq = Sequence::try_from(seq_bytes)
        .map_err(|e| Error::StoreCorrupt(key.into(), e))?;
    Ok((seq, deserialize(val_bytes)?))
}
