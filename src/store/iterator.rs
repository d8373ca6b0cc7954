//! Store iterator
//!
//! Sequential access over raw records, skipping the obfuscation key entry.

use serde::de::DeserializeOwned;

use crate::backend::RawIter;
use crate::codec;
use crate::error::{handle_status, Result};
use crate::obfuscate::{is_sentinel, ObfuscateKey};

/// A stored record exactly as the engine holds it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Serialized key (never obfuscated)
    pub key: Vec<u8>,
    /// Serialized, obfuscated value
    pub value: Vec<u8>,
}

impl RawRecord {
    /// Decode the key as `K`
    pub fn key<K: DeserializeOwned>(&self) -> Result<K> {
        codec::deserialize(&self.key)
    }

    /// Unmask the value with `obfuscate_key` and decode it as `V`
    pub fn value<V: DeserializeOwned>(&self, obfuscate_key: &ObfuscateKey) -> Result<V> {
        let mut value = self.value.clone();
        obfuscate_key.apply(&mut value);
        codec::deserialize(&value)
    }
}

/// Cursor over records in ascending key-byte order
///
/// Borrows the store it came from. Engine failures are yielded as errors and
/// iteration may continue afterwards at the caller's discretion.
pub struct StoreIterator<'a> {
    inner: RawIter<'a>,
}

impl<'a> StoreIterator<'a> {
    pub(crate) fn new(inner: RawIter<'a>) -> Self {
        Self { inner }
    }
}

impl Iterator for StoreIterator<'_> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok((key, _)) if is_sentinel(&key) => continue,
                Ok((key, value)) => return Some(Ok(RawRecord { key, value })),
                Err(status) => return Some(Err(handle_status("iterate", status))),
            }
        }
    }
}
