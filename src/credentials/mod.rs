//! Credential storage for the session marker
//!
//! The dashboard only needs a tiny key-value capability to remember
//! whether the operator is logged in across restarts. Backends are
//! pluggable through the `CredentialStore` trait.

pub mod sqlite_store;

pub use sqlite_store::SqliteCredentialStore;

use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Errors that can occur during credential store operations
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential store lock poisoned")]
    Poisoned,
}

/// Trait for persisted key-value credential backends
///
/// No expiry or network semantics; a value stays until it is removed.
pub trait CredentialStore: Send + Sync {
    /// Get the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>, CredentialError>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), CredentialError>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), CredentialError>;

    /// Whether `key` holds a truthy value
    ///
    /// Empty strings, "false" and "0" count as absent.
    fn is_marked(&self, key: &str) -> Result<bool, CredentialError> {
        Ok(matches!(self.get(key)?, Some(v) if is_truthy(&v)))
    }
}

pub(crate) fn is_truthy(value: &str) -> bool {
    !matches!(value.trim(), "" | "false" | "0")
}

/// Process-local credential store (nothing survives a restart)
#[derive(Default)]
pub struct MemoryCredentialStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, CredentialError> {
        let values = self.values.lock().map_err(|_| CredentialError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CredentialError> {
        let mut values = self.values.lock().map_err(|_| CredentialError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CredentialError> {
        let mut values = self.values.lock().map_err(|_| CredentialError::Poisoned)?;
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryCredentialStore::new();

        assert!(store.get("admin").unwrap().is_none());
        store.set("admin", "true").unwrap();
        assert_eq!(store.get("admin").unwrap().as_deref(), Some("true"));

        store.remove("admin").unwrap();
        assert!(store.get("admin").unwrap().is_none());

        // Removing twice is fine
        store.remove("admin").unwrap();
    }

    #[test]
    fn test_truthy_marker() {
        let store = MemoryCredentialStore::new();
        assert!(!store.is_marked("admin").unwrap());

        store.set("admin", "").unwrap();
        assert!(!store.is_marked("admin").unwrap());

        store.set("admin", "false").unwrap();
        assert!(!store.is_marked("admin").unwrap());

        store.set("admin", "yes").unwrap();
        assert!(store.is_marked("admin").unwrap());
    }
}
