use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Storage key for the full task collection.
pub const TASKS_KEY: &str = "tasks";
/// Storage key for the full event collection.
pub const EVENTS_KEY: &str = "events";
/// Storage key for the blog post collection.
pub const POSTS_KEY: &str = "posts";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Failed to serialize snapshot: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// Key/value snapshot storage.
///
/// Each key holds one whole collection as a JSON array; writes replace the
/// previous snapshot, there are no incremental updates. Implementations are
/// selected at construction time: `Database` for on-disk persistence,
/// `MemoryStore` for tests and throwaway sessions.
pub trait SnapshotStore {
    /// Read the raw snapshot under `key`, or `None` when absent/unreadable.
    fn load_raw(&self, key: &str) -> Option<String>;
    /// Replace the snapshot under `key`.
    fn save_raw(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Load and parse a snapshot. Read and parse failures both degrade to
/// `None`; the caller decides whether that means "empty" or "seed data".
pub fn load_snapshot<T: DeserializeOwned>(store: &dyn SnapshotStore, key: &str) -> Option<T> {
    let raw = store.load_raw(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, %err, "discarding unreadable snapshot");
            None
        }
    }
}

/// Serialize and store a snapshot, best-effort. Failures are logged and
/// swallowed; persistence never blocks a mutation.
pub fn save_snapshot<T: Serialize>(store: &dyn SnapshotStore, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(StorageError::from)
        .and_then(|json| store.save_raw(key, &json));
    if let Err(err) = result {
        tracing::warn!(key, %err, "failed to persist snapshot");
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the snapshot database at `path` and initialize the
    /// schema.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;

        let db = Database { conn };
        db.initialize_schema()?;

        Ok(db)
    }

    /// Open an in-process database that is discarded on drop.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<(), StorageError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS snapshots (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl SnapshotStore for Database {
    fn load_raw(&self, key: &str) -> Option<String> {
        let result = self.conn.query_row(
            "SELECT value FROM snapshots WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get(0),
        );
        match result {
            Ok(value) => Some(value),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(err) => {
                tracing::warn!(key, %err, "snapshot read failed");
                None
            }
        }
    }

    fn save_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO snapshots (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            rusqlite::params![
                key,
                value,
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
            ],
        )?;
        Ok(())
    }
}

/// In-memory snapshot store. Used in tests and wherever no durable storage
/// is available; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn load_raw(&self, key: &str) -> Option<String> {
        self.map.borrow().get(key).cloned()
    }

    fn save_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.map
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
