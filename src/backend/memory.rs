//! In-memory ordered engine
//!
//! BTreeMap-based store with RwLock for concurrency.

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

use super::{Backend, BatchOp, EngineResult, RawIter, Status, WriteBatch, WriteOptions};

/// An engine that never touches the filesystem
///
/// ## Concurrency:
/// - Readers share the RwLock; every write takes it exclusively
/// - A batch is applied under a single write-lock acquisition, so readers
///   observe either none or all of it
/// - Iterators copy the visible range up front (point-in-time snapshot)
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &[u8]) -> EngineResult<Vec<u8>> {
        self.data.read().get(key).cloned().ok_or(Status::NotFound)
    }

    fn put(&self, key: &[u8], value: &[u8], _opts: &WriteOptions) -> EngineResult<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8], _opts: &WriteOptions) -> EngineResult<()> {
        self.data.write().remove(key);
        Ok(())
    }

    fn write(&self, batch: &WriteBatch, _opts: &WriteOptions) -> EngineResult<()> {
        let mut data = self.data.write();
        for op in batch.iter() {
            match op {
                BatchOp::Put { key, value } => {
                    data.insert(key.clone(), value.clone());
                }
                BatchOp::Delete { key } => {
                    data.remove(key);
                }
            }
        }
        Ok(())
    }

    fn iter_from(&self, start: &[u8]) -> RawIter<'_> {
        let snapshot: Vec<(Vec<u8>, Vec<u8>)> = self
            .data
            .read()
            .range::<[u8], _>((Bound::Included(start), Bound::Unbounded))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Box::new(snapshot.into_iter().map(Ok))
    }

    fn flush(&self) -> EngineResult<()> {
        // Nothing is ever pending
        Ok(())
    }
}
