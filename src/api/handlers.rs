use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::exchange::{self, ExchangeError, Kline};

use super::responses::{ErrorResponse, RootResponse};

/// Inclusive bounds enforced on the `limit` query parameter
const LIMIT_RANGE: std::ops::RangeInclusive<u32> = 1..=2000;

/// An endpoint failure: HTTP status plus a human-readable detail
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            detail: self.detail,
        });
        (self.status, body).into_response()
    }
}

/// Status mapping shared by the kline flow; the symbols handler intercepts
/// exchange-side errors before this conversion runs
impl From<ExchangeError> for ApiError {
    fn from(err: ExchangeError) -> Self {
        let status = match &err {
            ExchangeError::UnknownExchange(_) => StatusCode::NOT_FOUND,
            ExchangeError::Network { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ExchangeError::BadSymbol { .. } => StatusCode::NOT_FOUND,
            ExchangeError::BadTimeframe { .. } => StatusCode::BAD_REQUEST,
            ExchangeError::Unavailable { .. } | ExchangeError::Exchange { .. } => {
                StatusCode::BAD_GATEWAY
            }
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

/// Query parameters for the symbols endpoint
#[derive(Debug, Deserialize, IntoParams)]
pub struct SymbolsQuery {
    /// Exchange id from the registry (e.g. "kucoin")
    pub exchange_id: String,
}

/// Query parameters for the klines endpoint
#[derive(Debug, Deserialize, IntoParams)]
pub struct KlinesQuery {
    /// Exchange id from the registry
    pub exchange_id: String,
    /// Trading pair (e.g. "BTC/USDT")
    pub symbol: String,
    /// Timeframe (e.g. "1m", "5m", "1h", "1d")
    pub timeframe: String,
    /// Number of candles (1..=2000); defaults depend on `since`
    pub limit: Option<u32>,
    /// Start of the window, epoch milliseconds UTC
    pub since: Option<i64>,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses(
        (status = 200, description = "Service is running", body = RootResponse)
    )
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Crypto Chart API is running!".to_string(),
    })
}

/// Supported exchanges as an id -> display name mapping, in registry order
#[utoipa::path(
    get,
    path = "/exchanges",
    tag = "Market Data",
    responses(
        (status = 200, description = "Supported exchange ids and display names")
    )
)]
pub async fn get_exchanges() -> Json<serde_json::Value> {
    let map: serde_json::Map<String, serde_json::Value> = exchange::SUPPORTED_EXCHANGES
        .iter()
        .map(|(id, name)| (id.to_string(), serde_json::Value::from(*name)))
        .collect();
    Json(serde_json::Value::Object(map))
}

/// Simple spot pairs of one exchange
#[utoipa::path(
    get,
    path = "/symbols",
    tag = "Market Data",
    params(SymbolsQuery),
    responses(
        (status = 200, description = "Sorted symbol list, or a one-element display message"),
        (status = 404, description = "Unknown exchange id", body = ErrorResponse),
        (status = 503, description = "Network failure reaching the exchange", body = ErrorResponse)
    )
)]
pub async fn get_symbols(
    Query(query): Query<SymbolsQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    let mut connector = exchange::resolve(&query.exchange_id)?;
    let result = exchange::list_symbols(connector.as_mut()).await;
    connector.close().await;

    match result {
        Ok(symbols) => Ok(Json(symbols)),
        // Exchange-side failures on this endpoint surface as 200 with a
        // display message in the list rather than an error status
        Err(err) if err.is_exchange_side() => {
            tracing::warn!("{} on /symbols for {}", err, query.exchange_id);
            let message = match &err {
                ExchangeError::Unavailable { exchange, .. } => {
                    format!("Exchange {} is temporarily unavailable", exchange)
                }
                _ => format!("Failed to load trading pairs from {}", query.exchange_id),
            };
            Ok(Json(vec![message]))
        }
        Err(err) => {
            tracing::error!("{} on /symbols for {}", err, query.exchange_id);
            Err(err.into())
        }
    }
}

/// OHLCV candles for one symbol
#[utoipa::path(
    get,
    path = "/klines",
    tag = "Market Data",
    params(KlinesQuery),
    responses(
        (status = 200, description = "Ascending candle list", body = Vec<Kline>),
        (status = 400, description = "Invalid limit or unsupported timeframe", body = ErrorResponse),
        (status = 404, description = "Unknown exchange id or symbol", body = ErrorResponse),
        (status = 502, description = "Exchange-side error", body = ErrorResponse),
        (status = 503, description = "Network failure reaching the exchange", body = ErrorResponse)
    )
)]
pub async fn get_klines(Query(query): Query<KlinesQuery>) -> Result<Json<Vec<Kline>>, ApiError> {
    if let Some(limit) = query.limit {
        if !LIMIT_RANGE.contains(&limit) {
            return Err(ApiError::bad_request(format!(
                "limit must be between {} and {}, got {}",
                LIMIT_RANGE.start(),
                LIMIT_RANGE.end(),
                limit
            )));
        }
    }

    let params = exchange::resolve_fetch_params(query.limit, query.since);
    let mut connector = exchange::resolve(&query.exchange_id)?;
    let result =
        exchange::fetch_klines(connector.as_mut(), &query.symbol, &query.timeframe, &params).await;
    connector.close().await;

    match result {
        Ok(klines) => Ok(Json(klines)),
        Err(err) => {
            tracing::error!(
                "{} on /klines for {} {} {}",
                err,
                query.exchange_id,
                query.symbol,
                query.timeframe
            );
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_for(err: ExchangeError) -> StatusCode {
        ApiError::from(err).status
    }

    #[test]
    fn test_kline_status_mapping() {
        assert_eq!(
            status_for(ExchangeError::UnknownExchange("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(ExchangeError::Network {
                exchange: "okx",
                detail: "timeout".into()
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(ExchangeError::BadSymbol {
                exchange: "okx",
                symbol: "FOO/USDT".into(),
                detail: "nope".into()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(ExchangeError::BadTimeframe {
                exchange: "okx",
                requested: "7x".into(),
                available: vec!["1h"]
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(ExchangeError::Exchange {
                exchange: "okx",
                detail: "rejected".into()
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(ExchangeError::Unavailable {
                exchange: "okx",
                detail: "maintenance".into()
            }),
            StatusCode::BAD_GATEWAY
        );
    }
}
