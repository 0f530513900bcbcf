//! Persistent key-value boundary
//!
//! The production store (device-local storage) is an external collaborator;
//! the core only sees this narrow contract. Missing keys are normal (first
//! run), and callers on the game path treat write failures as non-fatal:
//! in-memory state is the source of truth, the store holds snapshots.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

/// Storage key for the mining stats JSON blob
pub const MINING_STATS_KEY: &str = "miningStats";
/// Storage key for the cumulative score
pub const SCORE_KEY: &str = "score";
/// Login/session tokens cleared on forced logout
pub const SESSION_TOKEN_KEYS: [&str; 4] = [
    "userToken",
    "kakaoAccessToken",
    "kakaoRefreshToken",
    "googleToken",
];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Narrow key-value contract the core persists through.
///
/// Implementations must return promptly; a slow backend is expected to
/// buffer writes internally rather than stall the tick that saved.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store used by the demo binary and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_reads_as_none() {
        let store = MemoryStore::new();
        assert!(store.get("absent").unwrap().is_none());
    }

    #[test]
    fn test_set_get_remove_round_trip() {
        let store = MemoryStore::new();
        store.set("score", "42").unwrap();
        assert_eq!(store.get("score").unwrap().as_deref(), Some("42"));
        store.remove("score").unwrap();
        assert!(store.get("score").unwrap().is_none());
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let store = MemoryStore::new();
        assert!(store.remove("absent").is_ok());
    }
}
