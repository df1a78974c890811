//! Conversation log.

use chrono::Utc;
use studopt_core::error::Result;
use studopt_core::types::{MessageDirection, MessageKind};

use crate::{db_err, Store};

impl Store {
    pub fn record_message(
        &self,
        user_id: &str,
        chat_id: &str,
        content: &str,
        kind: MessageKind,
        direction: MessageDirection,
    ) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO messages (user_id, chat_id, content, kind, direction, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                user_id,
                chat_id,
                content,
                kind.as_str(),
                direction.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn message_count(&self, user_id: &str) -> Result<i64> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE user_id = ?1",
            rusqlite::params![user_id],
            |r| r.get(0),
        )
        .map_err(db_err)
    }
}
