// Library Crate Root
// lib.rs

pub mod api;
pub mod bot;
pub mod config;
pub mod exchange;

pub use api::create_router;
pub use bot::BotService;
pub use config::Settings;
pub use exchange::{ExchangeError, Kline};
