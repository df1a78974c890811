//! Zalo Bot API channel — message sending and webhook management.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use studopt_core::config::BotApiConfig;
use studopt_core::error::{Result, StudoptError};
use studopt_core::types::{MessageKind, Sender};

use crate::DispatchSink;

/// Webhook event discriminators the platform sends.
pub mod events {
    pub const TEXT_RECEIVED: &str = "message.text.received";
    pub const IMAGE_RECEIVED: &str = "message.image.received";
    pub const STICKER_RECEIVED: &str = "message.sticker.received";
}

pub struct ZaloChannel {
    config: BotApiConfig,
    client: reqwest::Client,
}

impl ZaloChannel {
    pub fn new(config: BotApiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    /// Send a text message. Returns whether the platform accepted it.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<bool> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| StudoptError::Channel(format!("sendMessage failed: {e}")))?;

        let result: ZaloApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| StudoptError::Channel(format!("Invalid send response: {e}")))?;

        if !result.ok {
            tracing::warn!(
                "⚠️ sendMessage rejected for {chat_id}: {}",
                result.description.unwrap_or_default()
            );
        }
        Ok(result.ok)
    }

    /// Typing indicator, fire-and-forget.
    pub async fn send_chat_action(&self, chat_id: &str, action: &str) -> Result<bool> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "action": action,
        });
        let sent = self
            .client
            .post(self.api_url("sendChatAction"))
            .json(&body)
            .send()
            .await
            .is_ok();
        Ok(sent)
    }

    pub async fn set_webhook(&self, url: &str, secret_token: &str) -> Result<()> {
        let body = serde_json::json!({
            "url": url,
            "secret_token": secret_token,
        });
        let response = self
            .client
            .post(self.api_url("setWebhook"))
            .json(&body)
            .send()
            .await
            .map_err(|e| StudoptError::Channel(format!("setWebhook failed: {e}")))?;
        let result: ZaloApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| StudoptError::Channel(format!("Invalid setWebhook response: {e}")))?;
        if !result.ok {
            return Err(StudoptError::Channel(format!(
                "setWebhook rejected: {}",
                result.description.unwrap_or_default()
            )));
        }
        tracing::info!("🔗 Webhook registered at {url}");
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<()> {
        let response = self
            .client
            .post(self.api_url("deleteWebhook"))
            .send()
            .await
            .map_err(|e| StudoptError::Channel(format!("deleteWebhook failed: {e}")))?;
        let result: ZaloApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| StudoptError::Channel(format!("Invalid deleteWebhook response: {e}")))?;
        if !result.ok {
            return Err(StudoptError::Channel(format!(
                "deleteWebhook rejected: {}",
                result.description.unwrap_or_default()
            )));
        }
        Ok(())
    }

    pub async fn get_webhook_info(&self) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(self.api_url("getWebhookInfo"))
            .send()
            .await
            .map_err(|e| StudoptError::Channel(format!("getWebhookInfo failed: {e}")))?;
        let result: ZaloApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| StudoptError::Channel(format!("Invalid getWebhookInfo response: {e}")))?;
        result
            .result
            .ok_or_else(|| StudoptError::Channel("No webhook info".into()))
    }
}

#[async_trait]
impl DispatchSink for ZaloChannel {
    async fn send(&self, user_id: &str, text: &str) -> Result<bool> {
        self.send_message(user_id, text).await
    }

    async fn send_typing(&self, user_id: &str) -> Result<bool> {
        self.send_chat_action(user_id, "typing").await
    }
}

// --- Zalo Bot API types ---

#[derive(Debug, Deserialize)]
pub struct ZaloApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event_name: String,
    pub message: Option<EventMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub from: Option<EventUser>,
    pub chat: Option<EventChat>,
    pub text: Option<String>,
    pub sticker: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventUser {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventChat {
    pub id: String,
}

/// An inbound event normalized for dispatch.
#[derive(Debug, Clone)]
pub struct IncomingEvent {
    pub sender: Sender,
    pub kind: MessageKind,
    pub content: String,
}

impl WebhookEvent {
    /// Normalize for dispatch. Events without a sender are dropped.
    pub fn to_incoming(&self) -> Option<IncomingEvent> {
        let msg = self.message.as_ref()?;
        let from = msg.from.as_ref()?;

        let sender = Sender {
            external_id: from.id.clone(),
            display_name: from.display_name.clone().unwrap_or_default(),
            chat_id: msg
                .chat
                .as_ref()
                .map(|c| c.id.clone())
                .unwrap_or_else(|| from.id.clone()),
        };

        let (kind, content) = match self.event_name.as_str() {
            events::TEXT_RECEIVED => (MessageKind::Text, msg.text.clone()?),
            events::STICKER_RECEIVED => {
                (MessageKind::Sticker, msg.sticker.clone().unwrap_or_default())
            }
            events::IMAGE_RECEIVED => {
                (MessageKind::Photo, msg.photo_url.clone().unwrap_or_default())
            }
            _ => return None,
        };

        Some(IncomingEvent {
            sender,
            kind,
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_event(id: &str, text: &str) -> WebhookEvent {
        WebhookEvent {
            event_name: events::TEXT_RECEIVED.into(),
            message: Some(EventMessage {
                from: Some(EventUser {
                    id: id.into(),
                    display_name: Some("An".into()),
                }),
                chat: Some(EventChat { id: id.into() }),
                text: Some(text.into()),
                sticker: None,
                photo_url: None,
            }),
        }
    }

    #[test]
    fn test_api_url() {
        let channel = ZaloChannel::new(BotApiConfig {
            api_base_url: "https://bot-api.zapps.me".into(),
            bot_token: "tok123".into(),
            webhook_url: String::new(),
            webhook_secret: String::new(),
        });
        assert_eq!(
            channel.api_url("sendMessage"),
            "https://bot-api.zapps.me/bottok123/sendMessage"
        );
    }

    #[test]
    fn test_text_event_to_incoming() {
        let incoming = text_event("z1", "/help").to_incoming().unwrap();
        assert_eq!(incoming.sender.external_id, "z1");
        assert_eq!(incoming.kind, MessageKind::Text);
        assert_eq!(incoming.content, "/help");
    }

    #[test]
    fn test_sticker_event_to_incoming() {
        let event = WebhookEvent {
            event_name: events::STICKER_RECEIVED.into(),
            message: Some(EventMessage {
                from: Some(EventUser {
                    id: "z1".into(),
                    display_name: None,
                }),
                chat: None,
                text: None,
                sticker: Some("sticker-42".into()),
                photo_url: None,
            }),
        };
        let incoming = event.to_incoming().unwrap();
        assert_eq!(incoming.kind, MessageKind::Sticker);
        // Missing chat falls back to the sender id.
        assert_eq!(incoming.sender.chat_id, "z1");
    }

    #[test]
    fn test_unknown_event_dropped() {
        let mut event = text_event("z1", "hi");
        event.event_name = "message.unknown".into();
        assert!(event.to_incoming().is_none());
    }

    #[test]
    fn test_event_without_sender_dropped() {
        let mut event = text_event("z1", "hi");
        if let Some(m) = event.message.as_mut() {
            m.from = None;
        }
        assert!(event.to_incoming().is_none());
    }

    #[test]
    fn test_envelope_parses() {
        let body = r#"{"ok":false,"description":"invalid token"}"#;
        let parsed: ZaloApiResponse<serde_json::Value> = serde_json::from_str(body).unwrap();
        assert!(!parsed.ok);
        assert_eq!(parsed.description.as_deref(), Some("invalid token"));
        assert!(parsed.result.is_none());
    }
}
