//! # VeilKV
//!
//! A typed, obfuscated key-value layer over an ordered byte-store with:
//! - Generic read/write/erase/exists over any serde-serializable types
//! - Atomic multi-key batches with optional durable sync
//! - Per-database XOR obfuscation of stored values
//! - Clear separation of "not found" from engine failures
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Caller                             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ typed key / value
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Store                                │
//! │        (read / write / erase / exists / write_batch)        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │    Codec    │          │  Obfuscator  │
//!   │  (bincode)  │          │ (XOR values) │
//!   └──────┬──────┘          └──────┬───────┘
//!          └────────────┬───────────┘
//!                       ▼
//!               ┌──────────────┐
//!               │    Batch     │
//!               └──────┬───────┘
//!                      ▼
//!       ┌─────────────────────────────┐
//!       │   Backend (sled / memory)   │
//!       └─────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use veilkv::Store;
//!
//! let store = Store::open("unused", 1 << 20, true, false).unwrap();
//! store.write("a", &42u32, false).unwrap();
//! assert_eq!(store.read::<_, u32>("a").unwrap(), Some(42));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod backend;
pub mod codec;
pub mod obfuscate;
pub mod batch;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::Config;
pub use batch::Batch;
pub use obfuscate::ObfuscateKey;
pub use store::{RawRecord, Store, StoreIterator};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of VeilKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
