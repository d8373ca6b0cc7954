//! Backend Module
//!
//! The boundary with the ordered byte-store engine.
//!
//! ## Responsibilities
//! - Point lookups, puts and deletes over raw byte keys/values
//! - Atomic application of a `WriteBatch` (all ops or none)
//! - Ascending, byte-ordered iteration that borrows the engine
//! - Reporting failures as engine `Status` values
//!
//! ## Engines
//! - [`MemoryBackend`]: BTreeMap behind a RwLock, for ephemeral stores and tests
//! - [`SledBackend`]: persistent engine built on `sled`
//!
//! Nothing here knows about typed records or obfuscation; backends store
//! exactly the bytes they are handed.

mod disk;
mod memory;

use std::fmt;

pub use disk::SledBackend;
pub use memory::MemoryBackend;

/// Status reported by an engine for a failed operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The key is absent
    NotFound,

    /// Stored data failed the engine's integrity checks
    Corruption(String),

    /// The filesystem or device failed
    IoError(String),

    /// The request or the engine state is invalid
    InvalidArgument(String),

    /// The engine cannot perform the request
    NotSupported(String),
}

impl Status {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Status::NotFound)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::NotFound => write!(f, "NotFound"),
            Status::Corruption(msg) => write!(f, "Corruption: {}", msg),
            Status::IoError(msg) => write!(f, "IO error: {}", msg),
            Status::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Status::NotSupported(msg) => write!(f, "Not implemented: {}", msg),
        }
    }
}

/// Result of an engine operation
pub type EngineResult<T> = std::result::Result<T, Status>;

/// Options for a single write call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Block until the write is durable
    pub sync: bool,
}

impl WriteOptions {
    pub fn sync() -> Self {
        Self { sync: true }
    }
}

/// One operation inside a `WriteBatch`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// Ordered list of byte-level operations applied as one atomic unit
///
/// Operations on the same key are all kept; the engine applies them in
/// order so the last one wins.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
    /// Sum of key and value lengths
    approximate_size: usize,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.approximate_size += key.len() + value.len();
        self.ops.push(BatchOp::Put { key, value });
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.approximate_size += key.len();
        self.ops.push(BatchOp::Delete { key });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn approximate_size(&self) -> usize {
        self.approximate_size
    }

    pub fn clear(&mut self) {
        self.ops.clear();
        self.approximate_size = 0;
    }

    /// Operations in recorded order
    pub fn iter(&self) -> std::slice::Iter<'_, BatchOp> {
        self.ops.iter()
    }
}

/// Cursor over `(key, value)` pairs in ascending key order
pub type RawIter<'a> = Box<dyn Iterator<Item = EngineResult<(Vec<u8>, Vec<u8>)>> + 'a>;

/// An ordered byte-store engine
///
/// Implementations must be safe to share across threads; this crate adds no
/// locking of its own around engine calls.
pub trait Backend: Send + Sync {
    /// Fetch the value stored at `key` (`Status::NotFound` when absent)
    fn get(&self, key: &[u8]) -> EngineResult<Vec<u8>>;

    fn put(&self, key: &[u8], value: &[u8], opts: &WriteOptions) -> EngineResult<()>;

    fn delete(&self, key: &[u8], opts: &WriteOptions) -> EngineResult<()>;

    /// Apply every operation of `batch` atomically, in order
    fn write(&self, batch: &WriteBatch, opts: &WriteOptions) -> EngineResult<()>;

    /// Iterate from the first key `>= start`
    fn iter_from(&self, start: &[u8]) -> RawIter<'_>;

    /// Force all previous writes to durable storage
    fn flush(&self) -> EngineResult<()>;

    /// Iterate over the whole keyspace
    fn iter(&self) -> RawIter<'_> {
        self.iter_from(&[])
    }
}
