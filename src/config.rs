//! Runtime settings loaded from the process environment
//!
//! `.env` files are applied by the entry point via `dotenvy` before this
//! module reads anything. A missing bot token disables the bot lifecycle but
//! never prevents the API from serving.

/// Origins allowed when `ALLOWED_ORIGINS` is not set
const DEFAULT_ORIGINS: &[&str] = &[
    "http://localhost",
    "http://localhost:5500",
    "http://127.0.0.1:5500",
];

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub bot_token: Option<String>,
    pub allowed_origins: Vec<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            bot_token: std::env::var("BOT_TOKEN").ok().filter(|t| !t.is_empty()),
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_else(|_| {
                    DEFAULT_ORIGINS.iter().map(|s| s.to_string()).collect()
                }),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
