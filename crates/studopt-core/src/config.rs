//! Configuration management for StudOpt.
//!
//! Loaded from `~/.studopt/config.toml` by default, with serde defaults so a
//! partial file (or none at all) still yields a usable config.

use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StudoptError};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StudoptConfig {
    #[serde(default)]
    pub bot: BotApiConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub academic: AcademicConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub authz: AuthzConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Zalo Bot API credentials and webhook registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotApiConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Bot token issued by the Zalo bot platform.
    #[serde(default)]
    pub bot_token: String,
    /// Public URL the platform should deliver webhook events to.
    #[serde(default)]
    pub webhook_url: String,
    /// Shared secret echoed back in the `x-bot-api-secret-token` header.
    #[serde(default)]
    pub webhook_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Shared secret for the admin routes. Empty disables the admin surface.
    #[serde(default)]
    pub admin_secret: String,
}

/// Which academic year/semester enrollment and planning operate on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicConfig {
    #[serde(default = "default_year")]
    pub year: String,
    #[serde(default = "default_semester")]
    pub semester: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Fixed UTC offset of the deployment timezone (hours).
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i32,
    #[serde(default = "default_digest_cron")]
    pub daily_digest_cron: String,
    #[serde(default = "default_due_cron")]
    pub assignment_due_cron: String,
    /// Minutes before class start to fire the pre-start reminder.
    #[serde(default = "default_lead_minutes")]
    pub prestart_lead_minutes: i64,
}

/// Authorization allow-lists.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthzConfig {
    /// External user ids allowed to create class-wide assignments.
    #[serde(default)]
    pub assignment_editors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path. Empty means `~/.studopt/studopt.db`.
    #[serde(default)]
    pub db_path: String,
    /// Scheduler snapshot path. Empty means `~/.studopt/jobs.json`.
    #[serde(default)]
    pub snapshot_path: String,
}

fn default_api_base_url() -> String {
    "https://bot-api.zapps.me".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_year() -> String {
    "2025-2026".to_string()
}

fn default_semester() -> u8 {
    3
}

fn default_utc_offset() -> i32 {
    7
}

fn default_digest_cron() -> String {
    "0 9 * * *".to_string()
}

fn default_due_cron() -> String {
    "30 14 * * *".to_string()
}

fn default_lead_minutes() -> i64 {
    30
}

impl Default for BotApiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            bot_token: String::new(),
            webhook_url: String::new(),
            webhook_secret: String::new(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_secret: String::new(),
        }
    }
}

impl Default for AcademicConfig {
    fn default() -> Self {
        Self {
            year: default_year(),
            semester: default_semester(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset(),
            daily_digest_cron: default_digest_cron(),
            assignment_due_cron: default_due_cron(),
            prestart_lead_minutes: default_lead_minutes(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: String::new(),
            snapshot_path: String::new(),
        }
    }
}

impl StudoptConfig {
    /// Load from the default path, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| StudoptError::Config(e.to_string()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw =
            toml::to_string_pretty(self).map_err(|e| StudoptError::Config(e.to_string()))?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".studopt")
    }

    pub fn db_path(&self) -> PathBuf {
        if self.store.db_path.is_empty() {
            Self::home_dir().join("studopt.db")
        } else {
            PathBuf::from(&self.store.db_path)
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        if self.store.snapshot_path.is_empty() {
            Self::home_dir().join("jobs.json")
        } else {
            PathBuf::from(&self.store.snapshot_path)
        }
    }

    /// The deployment timezone as a fixed offset. Out-of-range offsets in
    /// the config file fall back to UTC.
    pub fn tz(&self) -> FixedOffset {
        match FixedOffset::east_opt(self.schedule.utc_offset_hours * 3600) {
            Some(tz) => tz,
            None => chrono::Utc.fix(),
        }
    }
}
