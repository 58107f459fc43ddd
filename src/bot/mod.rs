//! Telegram bot companion: API client and long-poll lifecycle

pub mod poller;
pub mod telegram;

pub use poller::BotService;
pub use telegram::{BotError, TelegramClient};
