use crypto_chart_api::{create_router, BotService, Settings};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crypto_chart_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env();

    // Start the bot poller as an independent task; the server never waits on it
    let bot = initialize_bot(&settings);

    let app = create_router(&settings.allowed_origins);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .unwrap();

    tracing::info!("🚀 Crypto Chart API running on http://{}", settings.bind_addr);
    tracing::info!("📚 Swagger UI: http://{}/swagger-ui", settings.bind_addr);
    tracing::info!("📊 Endpoints: /exchanges /symbols /klines");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    // Shutdown: stop the poll loop and close the chat session
    if let Some((service, handle)) = bot {
        handle.abort();
        service.close().await;
    }
    tracing::info!("Server stopped");
}

/// Spawn the bot polling task when a token is configured
fn initialize_bot(
    settings: &Settings,
) -> Option<(Arc<BotService>, tokio::task::JoinHandle<()>)> {
    let Some(token) = &settings.bot_token else {
        tracing::warn!("BOT_TOKEN is not set. Telegram bot will not be started.");
        return None;
    };

    let service = Arc::new(BotService::new(token));
    let handle = Arc::clone(&service).spawn_polling();
    tracing::info!("🤖 Telegram bot task spawned");
    Some((service, handle))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
