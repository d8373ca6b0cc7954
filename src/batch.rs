//! Typed write batches
//!
//! A `Batch` serializes typed keys and values as they are added and queues
//! the resulting byte operations. Nothing reaches the engine until the batch
//! is handed to `Store::write_batch`, which applies it atomically.

use serde::Serialize;

use crate::backend::WriteBatch;
use crate::codec;
use crate::error::{Result, StoreError};
use crate::obfuscate::{self, ObfuscateKey};

/// Batch of changes queued to be written to a `Store`
///
/// Borrows the store's obfuscation key, so a batch can only be built while
/// its store is alive. Not meant to be filled from several threads at once.
pub struct Batch<'a> {
    ops: WriteBatch,
    obfuscate_key: &'a ObfuscateKey,
}

impl<'a> Batch<'a> {
    pub(crate) fn new(obfuscate_key: &'a ObfuscateKey) -> Self {
        Self {
            ops: WriteBatch::new(),
            obfuscate_key,
        }
    }

    /// Queue `key = value`; only the value bytes are obfuscated
    pub fn put<K, V>(&mut self, key: &K, value: &V) -> Result<()>
    where
        K: Serialize + ?Sized,
        V: Serialize + ?Sized,
    {
        let key = encode_key(key)?;
        let mut value = codec::serialize(value)?;
        self.obfuscate_key.apply(&mut value);

        self.ops.put(key, value);
        Ok(())
    }

    /// Queue removal of `key`
    pub fn delete<K>(&mut self, key: &K) -> Result<()>
    where
        K: Serialize + ?Sized,
    {
        let key = encode_key(key)?;
        self.ops.delete(key);
        Ok(())
    }

    /// Number of queued operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Approximate number of key and value bytes queued
    pub fn size_estimate(&self) -> usize {
        self.ops.approximate_size()
    }

    /// Drop every queued operation
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub(crate) fn obfuscate_key(&self) -> &ObfuscateKey {
        self.obfuscate_key
    }

    pub(crate) fn ops(&self) -> &WriteBatch {
        &self.ops
    }
}

/// Serialize a caller key, refusing the reserved obfuscation key entry
fn encode_key<K>(key: &K) -> Result<Vec<u8>>
where
    K: Serialize + ?Sized,
{
    let key = codec::serialize(key)?;
    if obfuscate::is_sentinel(&key) {
        return Err(StoreError::InvalidArgument(
            "key collides with the reserved obfuscation key entry".to_string(),
        ));
    }
    Ok(key)
}
