//! Synchronous key-value storage areas.
//!
//! Every operation is total: storage failures (including a write over the
//! configured quota) are logged and turned into no-ops, so callers can treat
//! writes as always succeeding.

use crate::Result;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// A named persistent storage area.
pub trait KeyValueStore: Send + Sync {
    /// Raw text stored under `name`, if any.
    fn get(&self, name: &str) -> Option<String>;

    /// Store `value` under `name`, replacing any previous value.
    fn set(&self, name: &str, value: &str);

    /// Delete `name`. Removing an absent key is a no-op.
    fn remove(&self, name: &str);
}

fn exceeds_quota(quota: Option<usize>, name: &str, value: &str) -> bool {
    match quota {
        Some(limit) if value.len() > limit => {
            warn!(
                target: "guideqa::store",
                "Quota exceeded writing '{}' ({} bytes > {}), write dropped",
                name,
                value.len(),
                limit
            );
            true
        }
        _ => false,
    }
}

/// In-process storage area, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject values larger than `bytes`.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, name: &str) -> Option<String> {
        self.entries().get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) {
        if exceeds_quota(self.quota, name, value) {
            return;
        }
        self.entries().insert(name.to_string(), value.to_string());
    }

    fn remove(&self, name: &str) {
        self.entries().remove(name);
    }
}

/// SQLite-backed storage area.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    quota: Option<usize>,
}

impl SqliteStore {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        debug!(target: "guideqa::store", "Opened store at {}", path.display());
        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
            quota: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Reject values larger than `bytes`.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                name TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, name: &str) -> Option<String> {
        let conn = self.conn();
        match conn
            .query_row(
                "SELECT value FROM kv WHERE name = ?1",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()
        {
            Ok(value) => value,
            Err(e) => {
                warn!(target: "guideqa::store", "Failed to read '{}': {}", name, e);
                None
            }
        }
    }

    fn set(&self, name: &str, value: &str) {
        if exceeds_quota(self.quota, name, value) {
            return;
        }
        let conn = self.conn();
        if let Err(e) = conn.execute(
            r#"
            INSERT INTO kv (name, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(name) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![name, value, chrono::Utc::now().to_rfc3339()],
        ) {
            warn!(target: "guideqa::store", "Failed to write '{}': {}", name, e);
        }
    }

    fn remove(&self, name: &str) {
        let conn = self.conn();
        if let Err(e) = conn.execute("DELETE FROM kv WHERE name = ?1", params![name]) {
            warn!(target: "guideqa::store", "Failed to remove '{}': {}", name, e);
        }
    }
}
