use axum::{http::HeaderValue, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{get_exchanges, get_klines, get_symbols, root};
use super::openapi::ApiDoc;

/// Create the API router with Swagger UI and the CORS allow-list
pub fn create_router(allowed_origins: &[String]) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(root))
        .route("/exchanges", get(get_exchanges))
        .route("/symbols", get(get_symbols))
        .route("/klines", get(get_klines))
        .layer(cors_layer(allowed_origins))
}

/// Fixed origin allow-list; any method and header for those origins
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
