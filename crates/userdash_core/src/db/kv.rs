//! Whole-value key/value slots.
//!
//! # Responsibility
//! - Define the durable storage contract used by repositories.
//! - Provide SQLite-backed and in-memory slot implementations.
//!
//! # Invariants
//! - `write_slot` replaces the full value under a key atomically.
//! - `read_slot` returns `None` only when the key was never written.

use super::DbResult;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Durable key/value storage holding serialized values.
pub trait KeyValueStorage {
    fn read_slot(&self, key: &str) -> DbResult<Option<String>>;
    fn write_slot(&self, key: &str, value: &str) -> DbResult<()>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for &S {
    fn read_slot(&self, key: &str) -> DbResult<Option<String>> {
        (**self).read_slot(key)
    }

    fn write_slot(&self, key: &str, value: &str) -> DbResult<()> {
        (**self).write_slot(key, value)
    }
}

/// SQLite-backed slot storage over the `kv_slots` table.
pub struct SqliteKeyValueStorage<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKeyValueStorage<'conn> {
    /// Wraps a connection returned by `open_db` / `open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl KeyValueStorage for SqliteKeyValueStorage<'_> {
    fn read_slot(&self, key: &str) -> DbResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_slots WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_slot(&self, key: &str, value: &str) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO kv_slots (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }
}

/// In-memory slot storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStorage {
    slots: RefCell<HashMap<String, String>>,
    writes: Cell<usize>,
}

impl MemoryKeyValueStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage with one slot already populated.
    pub fn with_slot(key: impl Into<String>, value: impl Into<String>) -> Self {
        let storage = Self::default();
        storage.slots.borrow_mut().insert(key.into(), value.into());
        storage
    }

    /// Number of `write_slot` calls observed so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl KeyValueStorage for MemoryKeyValueStorage {
    fn read_slot(&self, key: &str) -> DbResult<Option<String>> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn write_slot(&self, key: &str, value: &str) -> DbResult<()> {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}
