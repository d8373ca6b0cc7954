//! Value obfuscation
//!
//! Every stored value is XORed with a short per-database key so raw database
//! files do not show plaintext records. This deters casual inspection only;
//! it is not encryption.
//!
//! ## Persisted layout
//! ```text
//! key:   OBFUSCATE_KEY_KEY              (raw bytes, never obfuscated)
//! value: 8 random bytes                 (raw bytes, never obfuscated)
//! ```
//! Caller keys are never obfuscated so the engine can still order them.

use std::fmt;

use rand::Rng;

use crate::backend::{Backend, WriteOptions};
use crate::error::{handle_status, Result, StoreError};
use crate::store::backend_is_empty;

/// Engine key under which the obfuscation key is persisted
pub const OBFUSCATE_KEY_KEY: &[u8] = b"\x00obfuscate_key";

/// Length of the obfuscation key in bytes
pub const OBFUSCATE_KEY_NUM_BYTES: usize = 8;

/// The XOR mask applied to stored values
#[derive(Clone, PartialEq, Eq)]
pub struct ObfuscateKey {
    bytes: Vec<u8>,
}

impl ObfuscateKey {
    /// A fresh random key with no zero bytes
    ///
    /// A zero byte would leave every payload byte at its position unmasked.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let bytes = (0..OBFUSCATE_KEY_NUM_BYTES)
            .map(|_| rng.gen_range(1..=u8::MAX))
            .collect();
        Self { bytes }
    }

    /// The all-zero key; applying it leaves payloads unchanged
    pub fn zero() -> Self {
        Self {
            bytes: vec![0u8; OBFUSCATE_KEY_NUM_BYTES],
        }
    }

    /// Rebuild a key read back from storage
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != OBFUSCATE_KEY_NUM_BYTES {
            return Err(StoreError::Corruption(format!(
                "obfuscation key has {} bytes, expected {}",
                bytes.len(),
                OBFUSCATE_KEY_NUM_BYTES
            )));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// True when applying the key cannot change anything
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// XOR `payload` in place, repeating the key to cover its length.
    ///
    /// The operation is its own inverse: the same call masks and unmasks.
    pub fn apply(&self, payload: &mut [u8]) {
        if self.is_zero() {
            return;
        }
        for (byte, mask) in payload.iter_mut().zip(self.bytes.iter().cycle()) {
            *byte ^= mask;
        }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Debug for ObfuscateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObfuscateKey").field(&self.to_hex()).finish()
    }
}

/// True if `key` is the reserved sentinel entry
pub fn is_sentinel(key: &[u8]) -> bool {
    key == OBFUSCATE_KEY_KEY
}

/// Read the persisted key, creating one for fresh stores.
///
/// - Sentinel present: use it as-is.
/// - Sentinel absent, no caller records, `obfuscate` on: generate a key and
///   persist it with a synchronous write before returning.
/// - Sentinel absent otherwise: the store predates obfuscation (or has it
///   disabled), so values are plaintext and the all-zero key is used.
pub fn load_or_create(backend: &dyn Backend, obfuscate: bool) -> Result<ObfuscateKey> {
    match backend.get(OBFUSCATE_KEY_KEY) {
        Ok(bytes) => ObfuscateKey::from_bytes(&bytes),
        Err(status) if status.is_not_found() => {
            if obfuscate && backend_is_empty(backend)? {
                let key = ObfuscateKey::generate();
                backend
                    .put(OBFUSCATE_KEY_KEY, key.as_bytes(), &WriteOptions::sync())
                    .map_err(|status| handle_status("write", status))?;
                tracing::info!(key = %key.to_hex(), "wrote new obfuscation key");
                Ok(key)
            } else {
                if obfuscate {
                    tracing::warn!("store has records but no obfuscation key; values stay plaintext");
                }
                Ok(ObfuscateKey::zero())
            }
        }
        Err(status) => Err(handle_status("read", status)),
    }
}
