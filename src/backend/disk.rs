//! Persistent engine built on sled
//!
//! sled provides the ordered keyspace, atomic batches and crash safety;
//! this file only adapts its API and error type to the `Backend` boundary.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use super::{Backend, BatchOp, EngineResult, RawIter, Status, WriteBatch, WriteOptions};

/// File inside the database directory that sled locks while open
const LOCK_FILE: &str = "db";

/// Upper bound on how long a drop waits for sled to let go of its lock
const RELEASE_TIMEOUT: Duration = Duration::from_secs(5);

const RELEASE_POLL: Duration = Duration::from_millis(2);

/// On-disk engine
///
/// sled holds an exclusive lock on its directory, so a second open of the
/// same path fails with `Status::IoError` while the first handle is alive.
/// Dropping the backend blocks until that lock is free again, so the path
/// can be reopened as soon as the drop returns.
pub struct SledBackend {
    db: sled::Db,
    // Must stay after `db`: fields drop in declaration order.
    _release: LockRelease,
}

/// Waits on drop until no one holds the engine's directory lock
///
/// sled's background IO threads keep the lock file open for a short while
/// after the last `Db` handle is dropped.
struct LockRelease {
    lock_path: PathBuf,
}

impl Drop for LockRelease {
    fn drop(&mut self) {
        let file = match OpenOptions::new().read(true).write(true).open(&self.lock_path) {
            Ok(file) => file,
            // Never created, or destroyed already
            Err(_) => return,
        };
        wait_for_unlock(&file, &self.lock_path);
    }
}

fn wait_for_unlock(file: &File, lock_path: &Path) {
    let deadline = Instant::now() + RELEASE_TIMEOUT;
    loop {
        match FileExt::try_lock_exclusive(file) {
            Ok(()) => {
                let _ = FileExt::unlock(file);
                tracing::debug!(path = %lock_path.display(), "engine lock released");
                return;
            }
            Err(_) if Instant::now() < deadline => thread::sleep(RELEASE_POLL),
            Err(e) => {
                tracing::warn!(
                    path = %lock_path.display(),
                    error = %e,
                    "engine lock still held after close"
                );
                return;
            }
        }
    }
}

impl SledBackend {
    /// Open or create the database in `path`
    pub fn open(path: &Path, cache_size: usize, flush_every_ms: Option<u64>) -> EngineResult<Self> {
        let db = sled::Config::new()
            .path(path)
            .cache_capacity(cache_size as u64)
            .flush_every_ms(flush_every_ms)
            .open()
            .map_err(map_sled_error)?;

        Ok(Self {
            db,
            _release: LockRelease {
                lock_path: path.join(LOCK_FILE),
            },
        })
    }

    /// Remove every file of the database in `path`
    ///
    /// A missing directory is not an error.
    pub fn destroy(path: &Path) -> std::io::Result<()> {
        match fs::remove_dir_all(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn sync_if(&self, opts: &WriteOptions) -> EngineResult<()> {
        if opts.sync {
            self.db.flush().map_err(map_sled_error)?;
        }
        Ok(())
    }
}

impl Backend for SledBackend {
    fn get(&self, key: &[u8]) -> EngineResult<Vec<u8>> {
        match self.db.get(key).map_err(map_sled_error)? {
            Some(value) => Ok(value.to_vec()),
            None => Err(Status::NotFound),
        }
    }

    fn put(&self, key: &[u8], value: &[u8], opts: &WriteOptions) -> EngineResult<()> {
        self.db.insert(key, value).map_err(map_sled_error)?;
        self.sync_if(opts)
    }

    fn delete(&self, key: &[u8], opts: &WriteOptions) -> EngineResult<()> {
        self.db.remove(key).map_err(map_sled_error)?;
        self.sync_if(opts)
    }

    fn write(&self, batch: &WriteBatch, opts: &WriteOptions) -> EngineResult<()> {
        let mut sled_batch = sled::Batch::default();
        for op in batch.iter() {
            match op {
                BatchOp::Put { key, value } => sled_batch.insert(key.as_slice(), value.as_slice()),
                BatchOp::Delete { key } => sled_batch.remove(key.as_slice()),
            }
        }

        self.db.apply_batch(sled_batch).map_err(map_sled_error)?;
        self.sync_if(opts)
    }

    fn iter_from(&self, start: &[u8]) -> RawIter<'_> {
        Box::new(self.db.range(start..).map(|entry| {
            entry
                .map(|(k, v)| (k.to_vec(), v.to_vec()))
                .map_err(map_sled_error)
        }))
    }

    fn flush(&self) -> EngineResult<()> {
        self.db.flush().map(|_| ()).map_err(map_sled_error)
    }
}

/// Translate a sled error into the engine status vocabulary
fn map_sled_error(err: sled::Error) -> Status {
    match err {
        sled::Error::Io(e) => Status::IoError(e.to_string()),
        sled::Error::Corruption { .. } => Status::Corruption(err.to_string()),
        sled::Error::Unsupported(msg) => Status::NotSupported(msg),
        sled::Error::ReportableBug(msg) => Status::InvalidArgument(msg),
        sled::Error::CollectionNotFound(_) => Status::InvalidArgument(err.to_string()),
    }
}
