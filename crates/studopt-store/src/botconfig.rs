//! Key/value runtime settings.

use chrono::Utc;
use studopt_core::error::Result;

use crate::{db_err, Store};

pub const KEY_BOT_ENABLED: &str = "bot_enabled";
pub const KEY_WELCOME_MESSAGE: &str = "welcome_message";
pub const KEY_DEFAULT_RESPONSE: &str = "default_response";

impl Store {
    pub fn config_get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT value FROM bot_config WHERE key = ?1")
            .map_err(db_err)?;
        Ok(stmt.query_row(rusqlite::params![key], |r| r.get(0)).ok())
    }

    pub fn config_set(&self, key: &str, value: &str, description: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO bot_config (key, value, description, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![key, value, description, Utc::now().to_rfc3339()],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Seed settings that dispatch relies on; existing values are kept.
    pub fn seed_config_defaults(&self) -> Result<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        for (key, value, desc) in [
            (KEY_BOT_ENABLED, "true", "Master switch for command dispatch"),
            (KEY_WELCOME_MESSAGE, "Chào mừng bạn đến với StudOpt! 🎓", "Greeting text"),
            (KEY_DEFAULT_RESPONSE, "", "Override for the unknown-input reply"),
        ] {
            conn.execute(
                "INSERT OR IGNORE INTO bot_config (key, value, description, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![key, value, desc, now],
            )
            .map_err(db_err)?;
        }
        Ok(())
    }

    /// Missing key counts as enabled.
    pub fn bot_enabled(&self) -> bool {
        match self.config_get(KEY_BOT_ENABLED) {
            Ok(Some(v)) => v != "false",
            _ => true,
        }
    }

    pub fn set_bot_enabled(&self, enabled: bool) -> Result<()> {
        self.config_set(
            KEY_BOT_ENABLED,
            if enabled { "true" } else { "false" },
            "Master switch for command dispatch",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_by_default() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.bot_enabled());
    }

    #[test]
    fn test_toggle() {
        let store = Store::open_in_memory().unwrap();
        store.set_bot_enabled(false).unwrap();
        assert!(!store.bot_enabled());
        store.set_bot_enabled(true).unwrap();
        assert!(store.bot_enabled());
    }

    #[test]
    fn test_seed_keeps_existing_values() {
        let store = Store::open_in_memory().unwrap();
        store.config_set(KEY_DEFAULT_RESPONSE, "Xin chào!", "").unwrap();
        store.seed_config_defaults().unwrap();
        assert_eq!(
            store.config_get(KEY_DEFAULT_RESPONSE).unwrap().as_deref(),
            Some("Xin chào!")
        );
        assert!(store.config_get(KEY_BOT_ENABLED).unwrap().is_some());
    }
}
