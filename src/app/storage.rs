// Persistent key-value store used to mirror the task list.
// SQLite holds one row per key; the task list lives under a single key.
// Based on https://github.com/rusqlite/rusqlite/blob/master/examples/persons/main.rs
use chrono::Utc;
use log::{error, info};
use rusqlite::{Connection, OptionalExtension};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::app::error::StorageError;

pub type StorageResult<T> = Result<T, StorageError>;

// Read/write of whole string values under a fixed key
pub trait KeyValueStore {
    fn read(&self, key: &str) -> StorageResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> StorageResult<()>;
}

pub struct SqliteStore {
    db_con: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> StorageResult<SqliteStore> {
        info!("event=store_open module=storage status=start mode=file");
        let db_con = Connection::open(path).map_err(|err| {
            error!("event=store_open module=storage status=error mode=file error={err}");
            StorageError::from(err)
        })?;
        SqliteStore::bootstrap(db_con)
    }

    pub fn open_in_memory() -> StorageResult<SqliteStore> {
        info!("event=store_open module=storage status=start mode=memory");
        SqliteStore::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(db_con: Connection) -> StorageResult<SqliteStore> {
        db_con.busy_timeout(Duration::from_secs(5))?;
        db_con.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                Key TEXT PRIMARY KEY,
                Value TEXT NOT NULL,
                UpdatedAt DATETIME NOT NULL
            );",
            (),
        )?;
        info!("event=store_open module=storage status=ok");
        Ok(SqliteStore { db_con })
    }
}

impl KeyValueStore for SqliteStore {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .db_con
            .query_row("SELECT Value FROM kv_store WHERE Key = ?1;", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        self.db_con.execute(
            "INSERT INTO kv_store (Key, Value, UpdatedAt) VALUES (?1, ?2, ?3)
             ON CONFLICT(Key) DO UPDATE
             SET Value = excluded.Value, UpdatedAt = excluded.UpdatedAt;",
            (key, value, Utc::now()),
        )?;
        Ok(())
    }
}

// Process-local store. Reads and writes can be made to fail on demand.
#[derive(Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
    pub fail_reads: Cell<bool>,
    pub fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn with_value(key: &str, value: &str) -> MemoryStore {
        let store = MemoryStore::default();
        store
            .values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        store
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        if self.fail_reads.get() {
            return Err(StorageError::Unavailable("read refused".into()));
        }
        Ok(self.get(key))
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_writes.get() {
            return Err(StorageError::Unavailable("write refused".into()));
        }
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_read_of_missing_key_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.read("@todos").unwrap(), None);
    }

    #[test]
    fn sqlite_write_overwrites_previous_value() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.write("@todos", "[]").unwrap();
        store.write("@todos", r#"[{"id":"1","title":"a"}]"#).unwrap();
        assert_eq!(
            store.read("@todos").unwrap().as_deref(),
            Some(r#"[{"id":"1","title":"a"}]"#)
        );
    }

    #[test]
    fn sqlite_value_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.write("@todos", "[]").unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.read("@todos").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn memory_store_failures_are_reported() {
        let store = MemoryStore::with_value("@todos", "[]");
        store.fail_reads.set(true);
        store.fail_writes.set(true);
        assert!(store.read("@todos").is_err());
        assert!(store.write("@todos", "x").is_err());
        assert_eq!(store.get("@todos").as_deref(), Some("[]"));
    }
}
