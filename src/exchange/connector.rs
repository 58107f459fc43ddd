//! Exchange connector abstraction
//!
//! Each supported venue implements [`ExchangeConnector`] over its public REST
//! API. Connectors are created per request by the registry, used once, and
//! closed on every exit path. They normalize venue responses into a common
//! shape: unified `BASE/QUOTE` symbols and ascending `[ts_ms, o, h, l, c, v]`
//! candle rows, leaving filtering and shaping to the layers above.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::errors::ExchangeError;
use super::klines::FetchParams;

/// Per-request timeout applied to every venue call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One tradable pair as reported by a venue
#[derive(Debug, Clone)]
pub struct Market {
    /// Unified symbol, e.g. "BTC/USDT"
    pub symbol: String,
    /// Venue-native identifier, e.g. "BTC-USDT" or "XXBTZUSD"
    pub native_id: String,
    /// True for swaps, perpetuals, futures and other derivatives
    pub derivative: bool,
}

/// One candle row as returned by a connector: `[ts_ms, o, h, l, c, v]`,
/// values may be JSON numbers or numeric strings depending on the venue
pub type RawCandle = Vec<Value>;

/// Connector to one external trading venue
#[async_trait]
pub trait ExchangeConnector: Send + Sync {
    /// Registry id of this venue
    fn id(&self) -> &'static str;

    /// Advertised timeframes as `(unified code, venue interval code)` pairs,
    /// or `None` if the venue does not publish a fixed set
    fn timeframes(&self) -> Option<&'static [(&'static str, &'static str)]>;

    /// Market metadata, available after a successful [`load_markets`](Self::load_markets)
    fn markets(&self) -> Option<&[Market]>;

    /// Fetch spot market metadata from the venue
    async fn load_markets(&mut self) -> Result<(), ExchangeError>;

    /// Fetch OHLCV rows for a unified symbol, ascending by timestamp
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        params: &FetchParams,
    ) -> Result<Vec<RawCandle>, ExchangeError>;

    /// Release the connector; called on every exit path
    async fn close(&mut self);
}

/// Build the shared HTTP client used by all connectors
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// GET a venue endpoint and decode the body as JSON.
///
/// Transport failures map to `Network`. HTTP 5xx with an undecodable body maps
/// to `Unavailable`, other undecodable bodies to `Exchange`. Bodies that decode
/// are returned together with the status so connectors can inspect venue error
/// envelopes delivered with 4xx statuses.
pub(crate) async fn get_json(
    client: &reqwest::Client,
    exchange: &'static str,
    url: &str,
) -> Result<(u16, Value), ExchangeError> {
    tracing::debug!("GET {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ExchangeError::Network {
            exchange,
            detail: e.to_string(),
        })?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| ExchangeError::Network {
            exchange,
            detail: format!("failed to read response: {}", e),
        })?;

    match serde_json::from_str::<Value>(&body) {
        Ok(value) => Ok((status, value)),
        Err(_) if (500..600).contains(&status) => Err(ExchangeError::Unavailable {
            exchange,
            detail: format!("HTTP {}", status),
        }),
        Err(e) => Err(ExchangeError::Exchange {
            exchange,
            detail: format!("unexpected response (HTTP {}): {}", status, e),
        }),
    }
}

/// Read a JSON value as f64, accepting numbers and numeric strings
pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Read a JSON value as i64, accepting numbers and numeric strings
pub(crate) fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s
            .parse::<i64>()
            .ok()
            .or_else(|| s.parse::<f64>().ok().map(|f| f as i64)),
        _ => None,
    }
}

/// Look up the venue interval code for a unified timeframe
pub(crate) fn venue_interval(
    table: &'static [(&'static str, &'static str)],
    timeframe: &str,
    exchange: &'static str,
) -> Result<&'static str, ExchangeError> {
    table
        .iter()
        .find(|(unified, _)| *unified == timeframe)
        .map(|(_, native)| *native)
        .ok_or_else(|| ExchangeError::BadTimeframe {
            exchange,
            requested: timeframe.to_string(),
            available: table.iter().map(|(unified, _)| *unified).collect(),
        })
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_as_f64_accepts_numbers_and_strings() {
        assert_eq!(as_f64(&json!(42.5)), Some(42.5));
        assert_eq!(as_f64(&json!("42.5")), Some(42.5));
        assert_eq!(as_f64(&json!(null)), None);
        assert_eq!(as_f64(&json!("abc")), None);
    }

    #[test]
    fn test_as_i64_accepts_fractional_strings() {
        assert_eq!(as_i64(&json!(1700000000000i64)), Some(1700000000000));
        assert_eq!(as_i64(&json!("1700000000000")), Some(1700000000000));
        assert_eq!(as_i64(&json!("1700000000.5")), Some(1700000000));
    }

    #[test]
    fn test_venue_interval_lookup() {
        const TABLE: &[(&str, &str)] = &[("1m", "1min"), ("1h", "1hour")];
        assert_eq!(venue_interval(TABLE, "1h", "kucoin").unwrap(), "1hour");

        let err = venue_interval(TABLE, "7x", "kucoin").unwrap_err();
        match err {
            ExchangeError::BadTimeframe { available, .. } => {
                assert_eq!(available, vec!["1m", "1h"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
