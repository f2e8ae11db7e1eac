//! SQLite implementation of the CredentialStore trait

use super::{CredentialError, CredentialStore};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS credentials (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);";

/// SQLite-based credential storage
///
/// Keeps the session marker in a small database file so a login
/// survives restarts of the dashboard.
pub struct SqliteCredentialStore {
    conn: Mutex<Connection>,
}

impl SqliteCredentialStore {
    /// Open (or create) a credential database at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, CredentialError> {
        let conn = Connection::open(db_path)?;
        let store = SqliteCredentialStore {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite database (useful for testing)
    pub fn in_memory() -> Result<Self, CredentialError> {
        let conn = Connection::open_in_memory()?;
        let store = SqliteCredentialStore {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), CredentialError> {
        let conn = self.conn.lock().map_err(|_| CredentialError::Poisoned)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }
}

impl CredentialStore for SqliteCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, CredentialError> {
        let conn = self.conn.lock().map_err(|_| CredentialError::Poisoned)?;
        let value = conn
            .query_row(
                "SELECT value FROM credentials WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CredentialError> {
        let conn = self.conn.lock().map_err(|_| CredentialError::Poisoned)?;
        conn.execute(
            "INSERT OR REPLACE INTO credentials (key, value, updated_at) VALUES (?, ?, ?)",
            params![key, value, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CredentialError> {
        let conn = self.conn.lock().map_err(|_| CredentialError::Poisoned)?;
        conn.execute("DELETE FROM credentials WHERE key = ?", params![key])?;
        Ok(())
    }
}
