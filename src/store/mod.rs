//! Store Module
//!
//! The typed, obfuscated handle over an ordered byte-store engine.
//!
//! ## Responsibilities
//! - Open (or wipe and recreate) the engine and load the obfuscation key
//! - Turn typed reads/writes into byte operations via the codec
//! - Mask values on the way in and unmask them on the way out
//! - Submit batches atomically, with or without a durable sync
//! - Map engine statuses into `StoreError`
//!
//! ## Read path
//! ```text
//! key ─► codec ─► engine.get ─► NotFound? ─► None
//!                     │
//!                     └─► unmask ─► codec ─► Some(value)
//! ```

mod iterator;

use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::{Backend, MemoryBackend, SledBackend, WriteOptions};
use crate::batch::Batch;
use crate::codec;
use crate::config::Config;
use crate::error::{handle_status, Result, StoreError};
use crate::obfuscate::{self, ObfuscateKey};

pub use iterator::{RawRecord, StoreIterator};

/// A typed key-value store
///
/// ## Concurrency
/// All methods take `&self`; a `Store` can be shared across threads (e.g. in
/// an `Arc`). Each call is a single engine call or a single atomic batch, and
/// thread-safety of those calls is the engine's responsibility.
///
/// ## Lifetime
/// The engine session is owned exclusively and released when the store is
/// dropped or closed. Batches and iterators borrow the store, so none can
/// outlive it.
pub struct Store {
    /// Store configuration
    config: Config,

    /// The open engine session
    backend: Box<dyn Backend>,

    /// Options for regular writes
    write_options: WriteOptions,

    /// Options for writes that must be durable on return
    sync_options: WriteOptions,

    /// XOR mask for stored values
    obfuscate_key: ObfuscateKey,
}

impl Store {
    /// Open or create a store
    ///
    /// - `in_memory`: keep everything in memory (`path` is ignored)
    /// - `wipe`: destroy any existing data at `path` first
    pub fn open(
        path: impl Into<PathBuf>,
        cache_size: usize,
        in_memory: bool,
        wipe: bool,
    ) -> Result<Self> {
        let config = Config::builder()
            .path(path)
            .cache_size(cache_size)
            .in_memory(in_memory)
            .wipe(wipe)
            .build();
        Self::with_config(config)
    }

    /// Open or create a store from a full config
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;

        let backend: Box<dyn Backend> = if config.in_memory {
            tracing::info!("opening in-memory store");
            Box::new(MemoryBackend::new())
        } else {
            if config.wipe {
                tracing::info!(path = %config.path.display(), "wiping store");
                SledBackend::destroy(&config.path)?;
            }
            fs::create_dir_all(&config.path)?;

            tracing::info!(path = %config.path.display(), "opening store");
            let backend = SledBackend::open(&config.path, config.cache_size, config.flush_every_ms)
                .map_err(|status| handle_status("open", status))?;
            Box::new(backend)
        };

        Self::with_backend(backend, config)
    }

    /// Wrap an already-open engine
    ///
    /// `config.path`, `in_memory` and `wipe` are not consulted here; the
    /// caller opened the engine. Loads or creates the obfuscation key before
    /// returning, so a store that fails here is never handed out.
    pub fn with_backend(backend: Box<dyn Backend>, config: Config) -> Result<Self> {
        let obfuscate_key = obfuscate::load_or_create(backend.as_ref(), config.obfuscate)?;
        tracing::debug!(key = %obfuscate_key.to_hex(), "using obfuscation key");

        Ok(Self {
            config,
            backend,
            write_options: WriteOptions { sync: false },
            sync_options: WriteOptions { sync: true },
            obfuscate_key,
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read the value stored at `key`
    ///
    /// Returns:
    /// - `Ok(Some(value))`: present and decodable as `V`
    /// - `Ok(None)`: absent, or present but not decodable as `V`
    /// - `Err(_)`: the engine failed
    pub fn read<K, V>(&self, key: &K) -> Result<Option<V>>
    where
        K: Serialize + ?Sized,
        V: DeserializeOwned,
    {
        match self.try_read(key) {
            Err(StoreError::Undecodable(msg)) => {
                tracing::warn!(error = %msg, "treating undecodable record as absent");
                Ok(None)
            }
            other => other,
        }
    }

    /// Like [`read`](Self::read), but an undecodable record is reported as
    /// `StoreError::Undecodable` instead of `None`
    pub fn try_read<K, V>(&self, key: &K) -> Result<Option<V>>
    where
        K: Serialize + ?Sized,
        V: DeserializeOwned,
    {
        let key = codec::serialize(key)?;
        match self.get_raw(&key)? {
            Some(mut value) => {
                self.obfuscate_key.apply(&mut value);
                codec::deserialize(&value).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Check whether `key` is present, without decoding its value
    pub fn exists<K>(&self, key: &K) -> Result<bool>
    where
        K: Serialize + ?Sized,
    {
        let key = codec::serialize(key)?;
        Ok(self.get_raw(&key)?.is_some())
    }

    /// Engine lookup with not-found folded into `None`
    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.backend.get(key) {
            Ok(value) => Ok(Some(value)),
            Err(status) if status.is_not_found() => Ok(None),
            Err(status) => Err(handle_status("read", status)),
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Start an empty batch for this store
    pub fn batch(&self) -> Batch<'_> {
        Batch::new(&self.obfuscate_key)
    }

    /// Store `value` at `key` as a single atomic write
    pub fn write<K, V>(&self, key: &K, value: &V, sync: bool) -> Result<()>
    where
        K: Serialize + ?Sized,
        V: Serialize + ?Sized,
    {
        let mut batch = self.batch();
        batch.put(key, value)?;
        self.write_batch(batch, sync)
    }

    /// Remove `key` as a single atomic write
    pub fn erase<K>(&self, key: &K, sync: bool) -> Result<()>
    where
        K: Serialize + ?Sized,
    {
        let mut batch = self.batch();
        batch.delete(key)?;
        self.write_batch(batch, sync)
    }

    /// Apply every operation in `batch` atomically
    ///
    /// With `sync`, returns only once the engine has made the batch durable.
    /// Without it, a crash may lose the batch (never part of it) until the
    /// engine's next background flush.
    pub fn write_batch(&self, batch: Batch<'_>, sync: bool) -> Result<()> {
        if batch.obfuscate_key() != &self.obfuscate_key {
            return Err(StoreError::InvalidArgument(
                "batch was built for a different store".to_string(),
            ));
        }

        let opts = if sync { &self.sync_options } else { &self.write_options };
        self.backend
            .write(batch.ops(), opts)
            .map_err(|status| handle_status("write", status))
    }

    /// Force pending writes to durable storage with an empty synced batch
    pub fn sync(&self) -> Result<()> {
        self.write_batch(self.batch(), true)
    }

    /// Ask the engine to persist everything written so far
    pub fn flush(&self) -> Result<()> {
        self.backend
            .flush()
            .map_err(|status| handle_status("flush", status))
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Cursor over all caller records in ascending key-byte order
    ///
    /// Yields raw bytes: values are still obfuscated. Decode with
    /// [`RawRecord::key`] and [`RawRecord::value`].
    pub fn new_iterator(&self) -> StoreIterator<'_> {
        StoreIterator::new(self.backend.iter())
    }

    /// Cursor starting at the first record whose key is `>= start`
    pub fn new_iterator_from<K>(&self, start: &K) -> Result<StoreIterator<'_>>
    where
        K: Serialize + ?Sized,
    {
        let start = codec::serialize(start)?;
        Ok(StoreIterator::new(self.backend.iter_from(&start)))
    }

    /// True if the store holds no caller records
    ///
    /// The obfuscation key entry does not count.
    pub fn is_empty(&self) -> Result<bool> {
        backend_is_empty(self.backend.as_ref())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Flush and release the engine
    ///
    /// Once this returns, the same path can be opened again.
    pub fn close(self) -> Result<()> {
        self.flush()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn obfuscate_key(&self) -> &ObfuscateKey {
        &self.obfuscate_key
    }

    pub fn obfuscate_key_hex(&self) -> String {
        self.obfuscate_key.to_hex()
    }

    /// The underlying engine, for raw inspection
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        tracing::debug!(in_memory = self.config.in_memory, "releasing store");
    }
}

/// True if `backend` holds nothing but (at most) the obfuscation key
pub(crate) fn backend_is_empty(backend: &dyn Backend) -> Result<bool> {
    for entry in backend.iter() {
        let (key, _) = entry.map_err(|status| handle_status("iterate", status))?;
        if !obfuscate::is_sentinel(&key) {
            return Ok(false);
        }
    }
    Ok(true)
}
