//! Bot lifecycle
//!
//! Two states: stopped (no token configured) and polling. The service is
//! constructed explicitly and spawned as an independent task next to the HTTP
//! server; the two share nothing but the process. Poll-loop errors are logged
//! and retried, never fatal.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::telegram::{Message, TelegramClient, Update};

/// Pause before retrying after a failed poll
const RETRY_BACKOFF: Duration = Duration::from_secs(5);

pub struct BotService {
    client: TelegramClient,
}

impl BotService {
    pub fn new(token: &str) -> Self {
        Self {
            client: TelegramClient::new(token),
        }
    }

    /// Start the long-poll loop as a concurrently scheduled task.
    /// Never blocks the caller.
    pub fn spawn_polling(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("🤖 Starting Telegram bot polling...");
            self.run_polling().await;
        })
    }

    async fn run_polling(&self) {
        let mut offset = 0i64;
        loop {
            match self.client.get_updates(offset).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        self.handle_update(update).await;
                    }
                }
                Err(e) => {
                    tracing::warn!("Bot polling error (retrying): {}", e);
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
            }
        }
    }

    async fn handle_update(&self, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        let chat_id = message.chat.id;
        let Some(reply) = reply_for(&message) else {
            return;
        };
        if let Err(e) = self.client.send_message(chat_id, &reply).await {
            tracing::warn!("Failed to reply in chat {}: {}", chat_id, e);
        }
    }

    /// Close the session to the chat platform
    pub async fn close(&self) {
        tracing::info!("Closing bot session...");
    }
}

/// Decide the reply for one inbound message, if any
fn reply_for(message: &Message) -> Option<String> {
    if let Some(web_app_data) = &message.web_app_data {
        return Some(echo_reply(&web_app_data.data));
    }

    let text = message.text.as_deref()?;
    if text == "/start" || text.starts_with("/start ") {
        let name = message
            .from
            .as_ref()
            .map(|u| u.full_name())
            .unwrap_or_else(|| "there".to_string());
        return Some(format!(
            "Hi, {}!\nTap the menu button ☰ (or /) in the lower left to open the crypto chart.",
            name
        ));
    }
    None
}

/// Echo a mini-app payload back, or report a parse failure
fn echo_reply(data: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(data) {
        Ok(_) => format!(
            "Thanks! Received from the mini-app: <code>{}</code>",
            escape_html(data)
        ),
        Err(_) => "Error: could not parse the data from the mini-app.".to_string(),
    }
}

/// Escape user-controlled text embedded into HTML replies
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::telegram::{Chat, User, WebAppData};

    fn message(text: Option<&str>, data: Option<&str>) -> Message {
        Message {
            chat: Chat { id: 1 },
            from: Some(User {
                first_name: "Ada".to_string(),
                last_name: Some("Lovelace".to_string()),
            }),
            text: text.map(str::to_string),
            web_app_data: data.map(|d| WebAppData {
                data: d.to_string(),
            }),
        }
    }

    #[test]
    fn test_start_command_greets_by_name() {
        let reply = reply_for(&message(Some("/start"), None)).unwrap();
        assert!(reply.starts_with("Hi, Ada Lovelace!"));
    }

    #[test]
    fn test_other_text_is_ignored() {
        assert!(reply_for(&message(Some("hello"), None)).is_none());
        assert!(reply_for(&message(None, None)).is_none());
    }

    #[test]
    fn test_web_app_payload_is_echoed_raw() {
        let reply = reply_for(&message(None, Some(r#"{"pair":"BTC/USDT"}"#))).unwrap();
        assert!(reply.contains(r#"<code>{"pair":"BTC/USDT"}</code>"#));
    }

    #[test]
    fn test_web_app_parse_failure_reports_error() {
        let reply = reply_for(&message(None, Some("not json"))).unwrap();
        assert!(reply.contains("could not parse"));
    }

    #[test]
    fn test_echoed_payload_is_html_escaped() {
        let reply = echo_reply(r#""<b>&""#);
        assert!(reply.contains("&lt;b&gt;&amp;"));
        assert!(!reply.contains("<b>"));
    }
}
