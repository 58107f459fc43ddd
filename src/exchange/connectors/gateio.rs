//! Gate.io spot connector
//!
//! Markets from `/spot/currency_pairs`, candles from `/spot/candlesticks`.
//! Gate returns candle rows ascending but in its own column order
//! `[time(sec), quote_volume, close, high, low, open, base_volume, ...]`,
//! and signals errors as 4xx bodies with a `label` field.

use async_trait::async_trait;
use serde_json::Value;

use crate::exchange::connector::{get_json, http_client, ExchangeConnector, Market, RawCandle};
use crate::exchange::errors::ExchangeError;
use crate::exchange::klines::FetchParams;

const BASE_URL: &str = "https://api.gateio.ws/api/v4";

const TIMEFRAMES: &[(&str, &str)] = &[
    ("1m", "1m"),
    ("5m", "5m"),
    ("15m", "15m"),
    ("30m", "30m"),
    ("1h", "1h"),
    ("4h", "4h"),
    ("8h", "8h"),
    ("1d", "1d"),
    ("1w", "7d"),
];

pub struct Gateio {
    client: reqwest::Client,
    markets: Option<Vec<Market>>,
}

impl Gateio {
    pub fn new() -> Self {
        Self {
            client: http_client(),
            markets: None,
        }
    }

    /// Gate errors arrive as `{"label": ..., "message": ...}` with a 4xx status
    fn check_error(status: u16, body: &Value, symbol: Option<&str>) -> Result<(), ExchangeError> {
        if (200..300).contains(&status) {
            return Ok(());
        }
        let label = body["label"].as_str().unwrap_or_default();
        let detail = format!(
            "{}: {}",
            label,
            body["message"].as_str().unwrap_or("unknown error")
        );
        if label == "INVALID_CURRENCY_PAIR" || label == "CURRENCY_PAIR_NOT_FOUND" {
            if let Some(symbol) = symbol {
                return Err(ExchangeError::BadSymbol {
                    exchange: "gateio",
                    symbol: symbol.to_string(),
                    detail,
                });
            }
        }
        if (500..600).contains(&status) {
            return Err(ExchangeError::Unavailable {
                exchange: "gateio",
                detail,
            });
        }
        Err(ExchangeError::Exchange {
            exchange: "gateio",
            detail,
        })
    }

    fn native_id(&self, symbol: &str) -> String {
        if let Some(m) = self
            .markets
            .as_ref()
            .and_then(|ms| ms.iter().find(|m| m.symbol == symbol))
        {
            return m.native_id.clone();
        }
        symbol.replace('/', "_")
    }
}

impl Default for Gateio {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeConnector for Gateio {
    fn id(&self) -> &'static str {
        "gateio"
    }

    fn timeframes(&self) -> Option<&'static [(&'static str, &'static str)]> {
        Some(TIMEFRAMES)
    }

    fn markets(&self) -> Option<&[Market]> {
        self.markets.as_deref()
    }

    async fn load_markets(&mut self) -> Result<(), ExchangeError> {
        let url = format!("{}/spot/currency_pairs", BASE_URL);
        let (status, body) = get_json(&self.client, self.id(), &url).await?;
        Self::check_error(status, &body, None)?;

        let markets = body
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let native_id = entry["id"].as_str()?;
                        let base = entry["base"].as_str()?;
                        let quote = entry["quote"].as_str()?;
                        Some(Market {
                            symbol: format!("{}/{}", base, quote),
                            native_id: native_id.to_string(),
                            derivative: false,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        self.markets = Some(markets);
        Ok(())
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        params: &FetchParams,
    ) -> Result<Vec<RawCandle>, ExchangeError> {
        let interval =
            crate::exchange::connector::venue_interval(TIMEFRAMES, timeframe, self.id())?;

        let url = format!(
            "{}/spot/candlesticks?{}",
            BASE_URL,
            candles_query(&self.native_id(symbol), interval, params)
        );

        let (status, body) = get_json(&self.client, self.id(), &url).await?;
        Self::check_error(status, &body, Some(symbol))?;

        let mut candles = normalize_rows(&body);
        // With `from` set the venue got no limit, so trim the window here
        let limit = params.limit as usize;
        if candles.len() > limit {
            candles.truncate(limit);
        }
        Ok(candles)
    }

    async fn close(&mut self) {
        self.markets = None;
    }
}

/// Build the candlestick query string. The venue rejects requests that
/// combine `limit` with `from`, so an anchored window omits `limit` and the
/// fetch path trims the result instead
fn candles_query(currency_pair: &str, interval: &str, params: &FetchParams) -> String {
    match params.since {
        Some(since) => format!(
            "currency_pair={}&interval={}&from={}",
            currency_pair,
            interval,
            since / 1000
        ),
        None => format!(
            "currency_pair={}&interval={}&limit={}",
            currency_pair, interval, params.limit
        ),
    }
}

/// Reorder ascending gate rows into common-order candles; older six-column
/// rows carry only the quote volume, which is used as a fallback
fn normalize_rows(data: &Value) -> Vec<RawCandle> {
    data.as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let row = row.as_array()?;
                    if row.len() < 6 {
                        return Some(row.clone());
                    }
                    let ts_ms = crate::exchange::connector::as_i64(&row[0])? * 1000;
                    let volume = if row.len() >= 7 { &row[6] } else { &row[1] };
                    Some(vec![
                        Value::from(ts_ms),
                        row[5].clone(),
                        row[3].clone(),
                        row[4].clone(),
                        row[2].clone(),
                        volume.clone(),
                    ])
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_are_reordered() {
        let data = json!([["1700000000", "999", "105", "110", "90", "100", "12.5", "true"]]);
        let candles = normalize_rows(&data);
        assert_eq!(
            candles[0],
            vec![
                json!(1700000000000i64),
                json!("100"),  // open
                json!("110"),  // high
                json!("90"),   // low
                json!("105"),  // close
                json!("12.5"), // base volume
            ]
        );
    }

    #[test]
    fn test_invalid_pair_maps_to_bad_symbol() {
        let body = json!({"label": "INVALID_CURRENCY_PAIR", "message": "Invalid currency pair"});
        let err = Gateio::check_error(400, &body, Some("FOO/USDT")).unwrap_err();
        assert!(matches!(err, ExchangeError::BadSymbol { .. }));
    }

    #[test]
    fn test_native_id_fallback() {
        assert_eq!(Gateio::new().native_id("BTC/USDT"), "BTC_USDT");
    }

    #[test]
    fn test_anchored_window_omits_limit() {
        let params = FetchParams {
            limit: 1500,
            since: Some(1_700_000_000_000),
        };
        let query = candles_query("BTC_USDT", "1h", &params);
        assert_eq!(
            query,
            "currency_pair=BTC_USDT&interval=1h&from=1700000000"
        );
        assert!(!query.contains("limit"));

        let params = FetchParams {
            limit: 200,
            since: None,
        };
        assert_eq!(
            candles_query("BTC_USDT", "1h", &params),
            "currency_pair=BTC_USDT&interval=1h&limit=200"
        );
    }
}
