//! Configuration for VeilKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, StoreError};

/// Main configuration for a VeilKV store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Location
    // -------------------------------------------------------------------------
    /// Directory holding the engine's files (ignored when `in_memory`)
    pub path: PathBuf,

    /// Keep everything in memory; nothing touches the filesystem
    pub in_memory: bool,

    /// Destroy any existing data before opening
    pub wipe: bool,

    // -------------------------------------------------------------------------
    // Engine Tuning
    // -------------------------------------------------------------------------
    /// Engine cache capacity (in bytes)
    pub cache_size: usize,

    /// Background flush cadence of the engine (milliseconds).
    /// Bounds how much an unsynced write can lose on crash; `None` disables
    /// background flushing entirely.
    pub flush_every_ms: Option<u64>,

    // -------------------------------------------------------------------------
    // Obfuscation
    // -------------------------------------------------------------------------
    /// Create an obfuscation key for fresh stores.
    /// When false, fresh stores use the all-zero key (values stored as-is).
    pub obfuscate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./veilkv_data"),
            in_memory: false,
            wipe: false,
            cache_size: 8 * 1024 * 1024, // 8 MB
            flush_every_ms: Some(500),
            obfuscate: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.cache_size == 0 {
            return Err(StoreError::Config("cache_size must be non-zero".to_string()));
        }
        if !self.in_memory && self.path.as_os_str().is_empty() {
            return Err(StoreError::Config(
                "an on-disk store needs a path".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the database directory
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Keep the store entirely in memory
    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.config.in_memory = in_memory;
        self
    }

    /// Wipe existing data on open
    pub fn wipe(mut self, wipe: bool) -> Self {
        self.config.wipe = wipe;
        self
    }

    /// Set the engine cache size (in bytes)
    pub fn cache_size(mut self, bytes: usize) -> Self {
        self.config.cache_size = bytes;
        self
    }

    /// Set the engine's background flush cadence
    pub fn flush_every_ms(mut self, ms: Option<u64>) -> Self {
        self.config.flush_every_ms = ms;
        self
    }

    /// Enable or disable key creation for fresh stores
    pub fn obfuscate(mut self, obfuscate: bool) -> Self {
        self.config.obfuscate = obfuscate;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
