//! Minimal Telegram Bot API client
//!
//! Covers exactly what the bot lifecycle needs: `getUpdates` long polling and
//! `sendMessage` with HTML parse mode, plus the serde types for the update
//! payloads the bot reacts to.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const API_BASE: &str = "https://api.telegram.org";

/// Long-poll window requested from the chat platform
pub const POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Telegram request failed: {0}")]
    Request(String),

    #[error("Telegram API error: {0}")]
    Api(String),
}

/// One long-poll update
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub web_app_data: Option<WebAppData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub first_name: String,
    pub last_name: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

/// Structured payload posted back by the launched mini-application
#[derive(Debug, Clone, Deserialize)]
pub struct WebAppData {
    pub data: String,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// HTTP session to the chat platform
pub struct TelegramClient {
    client: reqwest::Client,
    base: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        // Client timeout must outlast the long-poll window
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base: format!("{}/bot{}", API_BASE, token),
        }
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, BotError> {
        let url = format!(
            "{}/getUpdates?offset={}&timeout={}",
            self.base, offset, POLL_TIMEOUT_SECS
        );
        let envelope: ApiEnvelope<Vec<Update>> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BotError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| BotError::Request(e.to_string()))?;

        if !envelope.ok {
            return Err(BotError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(envelope.result.unwrap_or_default())
    }

    /// Send an HTML-formatted message to a chat
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        let url = format!("{}/sendMessage", self.base);
        let envelope: ApiEnvelope<serde_json::Value> = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
            }))
            .send()
            .await
            .map_err(|e| BotError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| BotError::Request(e.to_string()))?;

        if !envelope.ok {
            return Err(BotError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_decodes_web_app_data() {
        let raw = r#"{
            "update_id": 731,
            "message": {
                "message_id": 12,
                "chat": {"id": 42, "type": "private"},
                "from": {"id": 7, "is_bot": false, "first_name": "Ada", "last_name": "L"},
                "web_app_data": {"data": "{\"pair\":\"BTC/USDT\"}", "button_text": "chart"}
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        let message = update.message.unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.from.as_ref().unwrap().full_name(), "Ada L");
        assert_eq!(
            message.web_app_data.unwrap().data,
            "{\"pair\":\"BTC/USDT\"}"
        );
    }

    #[test]
    fn test_update_decodes_plain_command() {
        let raw = r#"{
            "update_id": 732,
            "message": {
                "message_id": 13,
                "chat": {"id": 42, "type": "private"},
                "from": {"id": 7, "is_bot": false, "first_name": "Ada"},
                "text": "/start"
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        let message = update.message.unwrap();
        assert_eq!(message.text.as_deref(), Some("/start"));
        assert!(message.web_app_data.is_none());
    }
}
