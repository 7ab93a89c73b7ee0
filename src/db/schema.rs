use crate::db::{Storage, StorageKey, now_timestamp};
use crate::error::{AppError, Result};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Arc;

/// SQLite-backed local storage with thread-safe access.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Internal(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema()?;
        Ok(db)
    }

    /// Open in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Internal(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .map_err(|e| AppError::Internal(format!("Failed to initialize schema: {}", e)))?;

        Ok(())
    }

    /// List stored keys with their last update timestamp.
    pub fn list_keys(&self) -> Result<Vec<(String, i64)>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT key, updated_at FROM local_storage ORDER BY key")
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let keys = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(|e| AppError::Internal(format!("Failed to list keys: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect keys: {}", e)))?;

        Ok(keys)
    }

    /// Remove every stored key.
    pub fn clear(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM local_storage", [])
            .map_err(|e| AppError::Internal(format!("Failed to clear storage: {}", e)))?;
        Ok(rows)
    }
}

impl Storage for Database {
    fn get(&self, key: StorageKey) -> Result<Option<String>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT value FROM local_storage WHERE key = ?1",
            params![key.as_str()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to read '{}': {}", key, e)))
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO local_storage (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![key.as_str(), value, now_timestamp()],
        )
        .map_err(|e| AppError::Internal(format!("Failed to write '{}': {}", key, e)))?;
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM local_storage WHERE key = ?1",
            params![key.as_str()],
        )
        .map_err(|e| AppError::Internal(format!("Failed to remove '{}': {}", key, e)))?;
        Ok(())
    }
}
