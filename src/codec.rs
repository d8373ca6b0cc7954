//! Codec adapter
//!
//! Converts typed keys and values to bytes and back.
//!
//! ## Format
//! bincode with fixed-width, big-endian integers and no trailing bytes.
//! Big-endian fixed-width integers keep numeric keys sorted the same way
//! numerically and as raw bytes, which matters for ordered iteration.
//! The encoding is deterministic: equal values always produce equal bytes.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_big_endian()
        .reject_trailing_bytes()
}

/// Number of bytes `value` will occupy once serialized
pub fn estimate_size<T: Serialize + ?Sized>(value: &T) -> Result<usize> {
    options()
        .serialized_size(value)
        .map(|n| n as usize)
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Serialize `value` into a buffer reserved to the exact size up front
pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(estimate_size(value)?);
    options()
        .serialize_into(&mut buf, value)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

/// Deserialize a value; malformed or truncated input is `Undecodable`
pub fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    options()
        .deserialize(bytes)
        .map_err(|e| StoreError::Undecodable(e.to_string()))
}
