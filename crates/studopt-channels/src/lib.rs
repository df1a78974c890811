//! # StudOpt Channels
//!
//! Outbound delivery seam plus the Zalo Bot API implementation. Everything
//! upstream (dispatch, reminders) talks to [`DispatchSink`]; the gateway and
//! main wire in [`zalo::ZaloChannel`], tests wire in [`RecordingSink`].

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use studopt_core::error::Result;

pub mod zalo;

/// Outbound message sink. `send` returns whether the platform accepted the
/// message; transport failures surface as errors.
#[async_trait]
pub trait DispatchSink: Send + Sync {
    async fn send(&self, user_id: &str, text: &str) -> Result<bool>;

    /// Best-effort typing indicator; failures are swallowed.
    async fn send_typing(&self, user_id: &str) -> Result<bool>;
}

/// In-memory sink recording everything it is asked to send.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(String, String)>>,
    typing: Mutex<Vec<String>>,
    fail_for: Mutex<HashSet<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make future sends to this user report failure.
    pub fn fail_sends_to(&self, user_id: &str) {
        if let Ok(mut set) = self.fail_for.lock() {
            set.insert(user_id.to_string());
        }
    }

    pub fn sent_to(&self, user_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .map(|v| {
                v.iter()
                    .filter(|(u, _)| u == user_id)
                    .map(|(_, t)| t.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn typing_count(&self) -> usize {
        self.typing.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn last_sent(&self) -> Option<(String, String)> {
        self.sent.lock().ok().and_then(|v| v.last().cloned())
    }
}

#[async_trait]
impl DispatchSink for RecordingSink {
    async fn send(&self, user_id: &str, text: &str) -> Result<bool> {
        let failing = self
            .fail_for
            .lock()
            .map(|set| set.contains(user_id))
            .unwrap_or(false);
        if failing {
            return Ok(false);
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((user_id.to_string(), text.to_string()));
        }
        Ok(true)
    }

    async fn send_typing(&self, user_id: &str) -> Result<bool> {
        if let Ok(mut typing) = self.typing.lock() {
            typing.push(user_id.to_string());
        }
        Ok(true)
    }
}
