//! # StudOpt Store
//!
//! SQLite-backed persistence. One connection behind a mutex; schema applied
//! idempotently on open. Entity operations live in per-entity modules as
//! `impl Store` blocks.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use studopt_core::error::{Result, StudoptError};

mod assignments;
mod botconfig;
mod classes;
mod messages;
mod users;

pub use botconfig::{KEY_BOT_ENABLED, KEY_DEFAULT_RESPONSE, KEY_WELCOME_MESSAGE};

pub(crate) fn db_err(e: impl ToString) -> StudoptError {
    StudoptError::Store(e.to_string())
}

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (creating if needed) the database at `path` and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(db_err)?;
        Self::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn migrate(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                external_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL DEFAULT '',
                active INTEGER NOT NULL DEFAULT 1,
                notify INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS class_subjects (
                id TEXT PRIMARY KEY,
                subject_id TEXT NOT NULL,
                subject_name TEXT NOT NULL,
                teacher TEXT NOT NULL DEFAULT '',
                day_of_week INTEGER NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                year TEXT NOT NULL,
                semester INTEGER NOT NULL,
                is_main INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS user_class_subjects (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                class_subject_id TEXT NOT NULL,
                year TEXT NOT NULL,
                semester INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS assignments (
                id TEXT PRIMARY KEY,
                class_subject_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                deadline TEXT NOT NULL,
                deadline_remind TEXT,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS user_assignments (
                id TEXT PRIMARY KEY,
                assignment_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                is_deleted INTEGER NOT NULL DEFAULT 0,
                created_by TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                chat_id TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL,
                kind TEXT NOT NULL,
                direction TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS bot_config (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_ucs_user ON user_class_subjects(user_id);
            CREATE INDEX IF NOT EXISTS idx_ua_user ON user_assignments(user_id);
            CREATE INDEX IF NOT EXISTS idx_messages_user ON messages(user_id);",
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(db_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_schema() {
        let store = Store::open_in_memory().expect("open");
        let conn = store.lock().expect("lock");
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |r| r.get(0),
            )
            .expect("query");
        assert!(count >= 7);
    }

    #[test]
    fn test_open_on_disk_is_idempotent() {
        let path = std::env::temp_dir().join("studopt-store-test.db");
        let _ = std::fs::remove_file(&path);
        {
            let _store = Store::open(&path).expect("first open");
        }
        let _store = Store::open(&path).expect("second open");
        let _ = std::fs::remove_file(&path);
    }
}
