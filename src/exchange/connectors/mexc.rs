//! MEXC spot connector
//!
//! MEXC exposes a Binance-compatible surface: `/api/v3/exchangeInfo` for
//! markets and `/api/v3/klines` for candles (ascending, open time first,
//! close time and quote volumes after the first six columns). Intervals
//! differ slightly from Binance: one hour is spelled `60m`.

use async_trait::async_trait;
use serde_json::Value;

use crate::exchange::connector::{get_json, http_client, ExchangeConnector, Market, RawCandle};
use crate::exchange::errors::ExchangeError;
use crate::exchange::klines::FetchParams;

const BASE_URL: &str = "https://api.mexc.com";

const TIMEFRAMES: &[(&str, &str)] = &[
    ("1m", "1m"),
    ("5m", "5m"),
    ("15m", "15m"),
    ("30m", "30m"),
    ("1h", "60m"),
    ("4h", "4h"),
    ("1d", "1d"),
    ("1w", "1W"),
];

pub struct Mexc {
    client: reqwest::Client,
    markets: Option<Vec<Market>>,
}

impl Mexc {
    pub fn new() -> Self {
        Self {
            client: http_client(),
            markets: None,
        }
    }

    /// Binance-style errors arrive as `{"code": -1121, "msg": "..."}`
    fn check_error(body: &Value, symbol: Option<&str>) -> Result<(), ExchangeError> {
        let Some(code) = body["code"].as_i64() else {
            return Ok(());
        };
        let detail = format!(
            "{}: {}",
            code,
            body["msg"].as_str().unwrap_or("unknown error")
        );
        if let Some(symbol) = symbol {
            if detail.to_lowercase().contains("symbol") {
                return Err(ExchangeError::BadSymbol {
                    exchange: "mexc",
                    symbol: symbol.to_string(),
                    detail,
                });
            }
        }
        Err(ExchangeError::Exchange {
            exchange: "mexc",
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
        symbol.replace('/', "")
    }
}

impl Default for Mexc {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeConnector for Mexc {
    fn id(&self) -> &'static str {
        "mexc"
    }

    fn timeframes(&self) -> Option<&'static [(&'static str, &'static str)]> {
        Some(TIMEFRAMES)
    }

    fn markets(&self) -> Option<&[Market]> {
        self.markets.as_deref()
    }

    async fn load_markets(&mut self) -> Result<(), ExchangeError> {
        let url = format!("{}/api/v3/exchangeInfo", BASE_URL);
        let (_, body) = get_json(&self.client, self.id(), &url).await?;
        Self::check_error(&body, None)?;

        let markets = body["symbols"]
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let native_id = entry["symbol"].as_str()?;
                        let base = entry["baseAsset"].as_str()?;
                        let quote = entry["quoteAsset"].as_str()?;
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

        let mut url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            BASE_URL,
            self.native_id(symbol),
            interval,
            params.limit.min(1000)
        );
        if let Some(since) = params.since {
            url.push_str(&format!("&startTime={}", since));
        }

        let (_, body) = get_json(&self.client, self.id(), &url).await?;
        Self::check_error(&body, Some(symbol))?;

        Ok(normalize_rows(&body))
    }

    async fn close(&mut self) {
        self.markets = None;
    }
}

/// Trim ascending Binance-style rows to the first six columns
fn normalize_rows(data: &Value) -> Vec<RawCandle> {
    data.as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let row = row.as_array()?;
                    Some(row.iter().take(6).cloned().collect())
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
    fn test_one_hour_maps_to_60m() {
        let interval =
            crate::exchange::connector::venue_interval(TIMEFRAMES, "1h", "mexc").unwrap();
        assert_eq!(interval, "60m");
    }

    #[test]
    fn test_rows_trimmed_to_six_columns() {
        let data = json!([[
            1700000000000i64, "1", "2", "0.5", "1.5", "10",
            1700003599999i64, "15000", 42, "5", "7500", "0"
        ]]);
        let candles = normalize_rows(&data);
        assert_eq!(candles[0].len(), 6);
        assert_eq!(candles[0][0], json!(1700000000000i64));
        assert_eq!(candles[0][5], json!("10"));
    }

    #[test]
    fn test_invalid_symbol_error() {
        let body = json!({"code": -1121, "msg": "Invalid symbol."});
        let err = Mexc::check_error(&body, Some("FOO/USDT")).unwrap_err();
        assert!(matches!(err, ExchangeError::BadSymbol { .. }));
    }
}
