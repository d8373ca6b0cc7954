//! Tests for value obfuscation
//!
//! These tests verify:
//! - Stored value bytes differ from the plaintext encoding
//! - Keys are stored unobfuscated
//! - The key is stable across reopen and replaced by a wipe
//! - Stores created before obfuscation keep working

mod common;

use tempfile::TempDir;
use veilkv::backend::{Backend, Status};
use veilkv::codec;
use veilkv::obfuscate::{OBFUSCATE_KEY_KEY, OBFUSCATE_KEY_NUM_BYTES};
use veilkv::{Config, Store};

use common::{init_logging, memory_store};

fn open_at(path: &std::path::Path, wipe: bool) -> Store {
    init_logging();
    Store::open(path, 1024 * 1024, false, wipe).unwrap()
}

// =============================================================================
// Stored Bytes Tests
// =============================================================================

#[test]
fn test_raw_value_is_masked() {
    let store = memory_store();
    let value = "a plaintext value that should not appear on disk".to_string();

    store.write("secret", &value, false).unwrap();

    let raw_key = codec::serialize("secret").unwrap();
    let raw_value = store.backend().get(&raw_key).unwrap();
    let plain = codec::serialize(&value).unwrap();

    assert_eq!(raw_value.len(), plain.len());
    assert_ne!(raw_value, plain);
    assert_eq!(store.read::<_, String>("secret").unwrap(), Some(value));
}

#[test]
fn test_iterator_yields_masked_values() {
    let store = memory_store();
    store.write(&1u32, &0xdead_beef_u64, false).unwrap();

    let record = store.new_iterator().next().unwrap().unwrap();

    assert_eq!(record.key, codec::serialize(&1u32).unwrap());
    assert_ne!(record.value, codec::serialize(&0xdead_beef_u64).unwrap());
    assert_eq!(record.value::<u64>(store.obfuscate_key()).unwrap(), 0xdead_beef);
}

#[test]
fn test_sentinel_holds_raw_key() {
    let store = memory_store();

    let stored = store.backend().get(OBFUSCATE_KEY_KEY).unwrap();

    assert_eq!(stored.len(), OBFUSCATE_KEY_NUM_BYTES);
    assert_eq!(stored, store.obfuscate_key().as_bytes());
    assert_eq!(store.obfuscate_key_hex(), hex::encode(&stored));
}

#[test]
fn test_single_byte_values_always_masked() {
    let raw_key = codec::serialize("k").unwrap();

    for value in 0u8..=255 {
        let store = memory_store();
        store.write("k", &value, false).unwrap();

        let raw_value = store.backend().get(&raw_key).unwrap();
        assert_ne!(
            raw_value,
            vec![value],
            "key {} left value {} unmasked",
            store.obfuscate_key_hex(),
            value
        );
    }
}

#[test]
fn test_reserved_key_cannot_clobber_obfuscation_key() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");
    let reserved: [u8; 14] = *b"\x00obfuscate_key";

    let before = {
        let store = open_at(&path, false);
        store.write("data", &12345u64, true).unwrap();

        let result = store.write(&reserved, &0xdead_beef_u64, true);
        assert!(matches!(result, Err(veilkv::StoreError::InvalidArgument(_))));
        let result = store.erase(&reserved, true);
        assert!(matches!(result, Err(veilkv::StoreError::InvalidArgument(_))));

        let key = store.obfuscate_key().clone();
        store.close().unwrap();
        key
    };

    let store = open_at(&path, false);
    assert_eq!(store.obfuscate_key(), &before);
    assert_eq!(store.read::<_, u64>("data").unwrap(), Some(12345));
}

// =============================================================================
// Key Lifecycle Tests
// =============================================================================

#[test]
fn test_key_stable_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");

    let first = {
        let store = open_at(&path, false);
        store.write("k", &1u32, true).unwrap();
        store.obfuscate_key().clone()
    };

    let store = open_at(&path, false);
    assert_eq!(store.obfuscate_key(), &first);
    assert_eq!(store.read::<_, u32>("k").unwrap(), Some(1));
}

#[test]
fn test_wipe_generates_new_key() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");

    let first = open_at(&path, false).obfuscate_key().clone();
    let second = open_at(&path, true).obfuscate_key().clone();

    assert!(!first.is_zero());
    assert!(!second.is_zero());
    assert_ne!(first, second);
}

#[test]
fn test_in_memory_stores_get_distinct_keys() {
    let a = memory_store();
    let b = memory_store();
    assert_ne!(a.obfuscate_key(), b.obfuscate_key());
}

#[test]
fn test_legacy_store_reads_plaintext() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");

    {
        let config = Config::builder().path(&path).obfuscate(false).build();
        let store = Store::with_config(config).unwrap();
        assert!(store.obfuscate_key().is_zero());
        store.write("legacy", "plain", true).unwrap();

        let raw = store.backend().get(&codec::serialize("legacy").unwrap()).unwrap();
        assert_eq!(raw, codec::serialize("plain").unwrap());
    }

    // Records already exist, so no key is created even with obfuscation on
    let store = open_at(&path, false);
    assert!(store.obfuscate_key().is_zero());
    assert_eq!(
        store.backend().get(OBFUSCATE_KEY_KEY),
        Err(Status::NotFound)
    );
    assert_eq!(store.read::<_, String>("legacy").unwrap(), Some("plain".to_string()));
}

#[test]
fn test_corrupt_sentinel_aborts_open() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");

    {
        let store = open_at(&path, false);
        store
            .backend()
            .put(OBFUSCATE_KEY_KEY, b"short", &Default::default())
            .unwrap();
        store.flush().unwrap();
    }

    let result = Store::open(&path, 1024 * 1024, false, false);
    assert!(matches!(result, Err(veilkv::StoreError::Corruption(_))));
}
