//! User rows.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use studopt_core::error::Result;
use studopt_core::types::User;

use crate::{db_err, Store};

pub(crate) fn parse_ts(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_default()
}

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        external_id: row.get(1)?,
        name: row.get(2)?,
        active: row.get::<_, i64>(3)? != 0,
        notify: row.get::<_, i64>(4)? != 0,
        created_at: parse_ts(row.get(5)?),
        updated_at: parse_ts(row.get(6)?),
    })
}

const USER_COLS: &str = "id, external_id, name, active, notify, created_at, updated_at";

impl Store {
    pub fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {USER_COLS} FROM users WHERE external_id = ?1"
            ))
            .map_err(db_err)?;
        Ok(stmt
            .query_row(rusqlite::params![external_id], row_to_user)
            .ok())
    }

    pub fn upsert_user(&self, user: &User) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO users (id, external_id, name, active, notify, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                user.id,
                user.external_id,
                user.name,
                user.active as i64,
                user.notify as i64,
                user.created_at.to_rfc3339(),
                user.updated_at.to_rfc3339(),
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn set_user_active(&self, user_id: &str, active: bool) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE users SET active = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![active as i64, Utc::now().to_rfc3339(), user_id],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn set_user_notify(&self, user_id: &str, notify: bool) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE users SET notify = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![notify as i64, Utc::now().to_rfc3339(), user_id],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn all_users(&self) -> Result<Vec<User>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {USER_COLS} FROM users ORDER BY created_at"))
            .map_err(db_err)?;
        let rows = stmt.query_map([], row_to_user).map_err(db_err)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Users eligible for pushed reminders.
    pub fn find_active_notify_users(&self) -> Result<Vec<User>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {USER_COLS} FROM users WHERE active = 1 AND notify = 1 ORDER BY created_at"
            ))
            .map_err(db_err)?;
        let rows = stmt.query_map([], row_to_user).map_err(db_err)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}
