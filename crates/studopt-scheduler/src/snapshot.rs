//! File-based job snapshot — lightweight persistence.
//! One JSON file, overwritten on every save; only job identity and the
//! running flag are recorded, never callbacks.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use studopt_core::error::{Result, StudoptError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobState {
    pub name: String,
    pub running: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JobSnapshot {
    pub jobs: Vec<JobState>,
}

pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn save(&self, jobs: &[JobState]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let snapshot = JobSnapshot {
            jobs: jobs.to_vec(),
        };
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| StudoptError::Scheduler(e.to_string()))?;
        std::fs::write(&self.path, &json)?;
        tracing::debug!("💾 Saved {} job states to {}", jobs.len(), self.path.display());
        Ok(())
    }

    /// Missing or unreadable snapshots yield an empty list.
    pub fn load(&self) -> Vec<JobState> {
        if !self.path.exists() {
            return Vec::new();
        }
        match std::fs::read_to_string(&self.path) {
            Ok(json) => serde_json::from_str::<JobSnapshot>(&json)
                .map(|s| s.jobs)
                .unwrap_or_else(|e| {
                    tracing::warn!("⚠️ Failed to parse job snapshot: {e}");
                    Vec::new()
                }),
            Err(e) => {
                tracing::warn!("⚠️ Failed to read job snapshot: {e}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_round_trip() {
        let path = std::env::temp_dir().join("studopt-snapshot-test.json");
        let store = SnapshotStore::new(&path);
        let jobs = vec![
            JobState {
                name: "daily-notification".into(),
                running: false,
            },
            JobState {
                name: "daily-reminder-assignment-due".into(),
                running: true,
            },
        ];
        store.save(&jobs).expect("save");
        assert_eq!(store.load(), jobs);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_save_overwrites() {
        let path = std::env::temp_dir().join("studopt-snapshot-overwrite.json");
        let store = SnapshotStore::new(&path);
        store
            .save(&[JobState {
                name: "a".into(),
                running: false,
            }])
            .expect("save");
        store
            .save(&[JobState {
                name: "b".into(),
                running: false,
            }])
            .expect("save");
        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "b");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let store = SnapshotStore::new("/nonexistent/studopt/jobs.json");
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let path = std::env::temp_dir().join("studopt-snapshot-corrupt.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = SnapshotStore::new(&path);
        assert!(store.load().is_empty());
        let _ = std::fs::remove_file(&path);
    }
}
