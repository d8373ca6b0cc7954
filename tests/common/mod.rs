//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use veilkv::backend::{
    Backend, EngineResult, MemoryBackend, RawIter, Status, WriteBatch, WriteOptions,
};
use veilkv::{Config, Store};

/// Route the crate's log output through the test harness (RUST_LOG=veilkv=debug)
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn memory_store() -> Store {
    init_logging();
    Store::open("", 1024 * 1024, true, false).unwrap()
}

pub fn setup_temp_store() -> (TempDir, Store) {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open(temp_dir.path().join("db"), 1024 * 1024, false, false).unwrap();
    (temp_dir, store)
}

/// Switches that make a `FaultyBackend` report engine failures
#[derive(Default)]
pub struct Faults {
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub fail_iteration: AtomicBool,
}

impl Faults {
    pub fn set_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_iteration(&self, fail: bool) {
        self.fail_iteration.store(fail, Ordering::SeqCst);
    }
}

/// Memory engine that fails on demand
///
/// A failing write returns before touching the inner engine, the way a real
/// engine rejects a whole batch.
pub struct FaultyBackend {
    pub inner: Arc<MemoryBackend>,
    pub faults: Arc<Faults>,
}

impl FaultyBackend {
    pub fn new() -> (Self, Arc<MemoryBackend>, Arc<Faults>) {
        let inner = Arc::new(MemoryBackend::new());
        let faults = Arc::new(Faults::default());
        let backend = Self {
            inner: Arc::clone(&inner),
            faults: Arc::clone(&faults),
        };
        (backend, inner, faults)
    }

    fn io_error(&self) -> Status {
        Status::IoError("injected failure".to_string())
    }
}

impl Backend for FaultyBackend {
    fn get(&self, key: &[u8]) -> EngineResult<Vec<u8>> {
        if self.faults.fail_reads.load(Ordering::SeqCst) {
            return Err(self.io_error());
        }
        self.inner.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8], opts: &WriteOptions) -> EngineResult<()> {
        if self.faults.fail_writes.load(Ordering::SeqCst) {
            return Err(self.io_error());
        }
        self.inner.put(key, value, opts)
    }

    fn delete(&self, key: &[u8], opts: &WriteOptions) -> EngineResult<()> {
        if self.faults.fail_writes.load(Ordering::SeqCst) {
            return Err(self.io_error());
        }
        self.inner.delete(key, opts)
    }

    fn write(&self, batch: &WriteBatch, opts: &WriteOptions) -> EngineResult<()> {
        if self.faults.fail_writes.load(Ordering::SeqCst) {
            return Err(self.io_error());
        }
        self.inner.write(batch, opts)
    }

    fn iter_from(&self, start: &[u8]) -> RawIter<'_> {
        if self.faults.fail_iteration.load(Ordering::SeqCst) {
            return Box::new(std::iter::once(Err(Status::Corruption(
                "injected bad block".to_string(),
            ))));
        }
        self.inner.iter_from(start)
    }

    fn flush(&self) -> EngineResult<()> {
        if self.faults.fail_writes.load(Ordering::SeqCst) {
            return Err(self.io_error());
        }
        self.inner.flush()
    }
}

/// Store over a `FaultyBackend`, plus handles to its engine and switches
pub fn faulty_store() -> (Store, Arc<MemoryBackend>, Arc<Faults>) {
    init_logging();
    let (backend, inner, faults) = FaultyBackend::new();
    let store = Store::with_backend(Box::new(backend), Config::default()).unwrap();
    (store, inner, faults)
}
