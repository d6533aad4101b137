// 💾 Local Key-Value Storage - whole-object JSON under fixed keys
//
// The finance state is written wholesale on every change, one JSON
// document per key. SqliteStorage keeps those documents in a single table
// (WAL mode for crash recovery); MemoryStorage backs tests and throwaway
// sessions.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

pub const USER_KEY: &str = "@fintrackr_user";
pub const TRANSACTIONS_KEY: &str = "@fintrackr_transactions";
pub const GOALS_KEY: &str = "@fintrackr_goals";

/// Minimal string key-value contract the store persists through.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&mut self, key: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

// ============================================================================
// SQLITE STORAGE
// ============================================================================

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open (or create) the on-disk store
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;

        // Enable WAL mode for crash recovery
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_kv_table(&conn)?;
        Ok(SqliteStorage { conn })
    }

    /// Number of stored keys
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn setup_kv_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

impl KeyValueStore for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read key {}", key))?;

        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("Failed to write key {}", key))?;

        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.conn.execute("DELETE FROM kv_store", [])?;
        Ok(())
    }
}

// ============================================================================
// MEMORY STORAGE
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value directly, bypassing the failure switch
    pub fn with_item(mut self, key: &str, value: &str) -> Self {
        self.items.insert(key.to_string(), value.to_string());
        self
    }

    /// Make every subsequent write fail (simulates a full or broken disk)
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            bail!("storage unavailable: cannot write {}", key);
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        if self.fail_writes {
            bail!("storage unavailable: cannot remove {}", key);
        }
        self.items.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        if self.fail_writes {
            bail!("storage unavailable: cannot clear");
        }
        self.items.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_set_get_roundtrip() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();

        assert_eq!(storage.get_item(USER_KEY).unwrap(), None);

        storage.set_item(USER_KEY, r#"{"name":"Ana"}"#).unwrap();
        assert_eq!(
            storage.get_item(USER_KEY).unwrap().as_deref(),
            Some(r#"{"name":"Ana"}"#)
        );
    }

    #[test]
    fn test_sqlite_set_overwrites_last_write_wins() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();

        storage.set_item(GOALS_KEY, "[]").unwrap();
        storage.set_item(GOALS_KEY, r#"[{"id":"1"}]"#).unwrap();

        assert_eq!(storage.len().unwrap(), 1);
        assert_eq!(
            storage.get_item(GOALS_KEY).unwrap().as_deref(),
            Some(r#"[{"id":"1"}]"#)
        );
    }

    #[test]
    fn test_sqlite_remove_and_clear() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        for key in [USER_KEY, TRANSACTIONS_KEY, GOALS_KEY] {
            storage.set_item(key, "null").unwrap();
        }

        storage.remove_item(USER_KEY).unwrap();
        assert_eq!(storage.get_item(USER_KEY).unwrap(), None);
        assert_eq!(storage.len().unwrap(), 2);

        storage.clear().unwrap();
        assert!(storage.is_empty().unwrap());
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let dir = std::env::temp_dir().join(format!(
            "fintrackr-storage-test-{}",
            std::process::id()
        ));
        let path = dir.join("nested").join("state.db");

        {
            let mut storage = SqliteStorage::open(&path).unwrap();
            storage.set_item(TRANSACTIONS_KEY, "[]").unwrap();
        }

        let storage = SqliteStorage::open(&path).unwrap();
        assert_eq!(
            storage.get_item(TRANSACTIONS_KEY).unwrap().as_deref(),
            Some("[]")
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_memory_storage_failing_writes() {
        let mut storage = MemoryStorage::new().with_item(USER_KEY, "null");
        storage.set_fail_writes(true);

        assert!(storage.set_item(GOALS_KEY, "[]").is_err());
        assert!(storage.clear().is_err());
        // Reads keep working
        assert_eq!(storage.get_item(USER_KEY).unwrap().as_deref(), Some("null"));
    }
}
