use utoipa::OpenApi;

use crate::api::handlers;
use crate::api::responses::{ErrorResponse, RootResponse};
use crate::exchange::Kline;

/// OpenAPI specification served through Swagger UI
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Crypto Chart API",
        version = "0.1.0",
        description = "Cryptocurrency market data proxy for the chart mini-app"
    ),
    paths(
        handlers::root,
        handlers::get_exchanges,
        handlers::get_symbols,
        handlers::get_klines,
    ),
    components(schemas(Kline, ErrorResponse, RootResponse)),
    tags(
        (name = "Health", description = "Liveness endpoints"),
        (name = "Market Data", description = "Exchange, symbol and candle endpoints"),
    )
)]
pub struct ApiDoc;
