//! HTX (Huobi) spot connector
//!
//! Markets from `/v1/common/symbols`, candles from `/market/history/kline`.
//! HTX returns candles newest-first as objects rather than arrays, and its
//! kline endpoint has no start-time parameter, so `since` is applied
//! client-side after the fetch.

use async_trait::async_trait;
use serde_json::Value;

use crate::exchange::connector::{get_json, http_client, ExchangeConnector, Market, RawCandle};
use crate::exchange::errors::ExchangeError;
use crate::exchange::klines::FetchParams;

const BASE_URL: &str = "https://api.huobi.pro";

const TIMEFRAMES: &[(&str, &str)] = &[
    ("1m", "1min"),
    ("5m", "5min"),
    ("15m", "15min"),
    ("30m", "30min"),
    ("1h", "60min"),
    ("4h", "4hour"),
    ("1d", "1day"),
    ("1w", "1week"),
];

pub struct Htx {
    client: reqwest::Client,
    markets: Option<Vec<Market>>,
}

impl Htx {
    pub fn new() -> Self {
        Self {
            client: http_client(),
            markets: None,
        }
    }

    fn check_status(body: &Value, symbol: Option<&str>) -> Result<(), ExchangeError> {
        if body["status"].as_str() == Some("ok") {
            return Ok(());
        }
        let detail = format!(
            "{}: {}",
            body["err-code"].as_str().unwrap_or("unknown"),
            body["err-msg"].as_str().unwrap_or("unknown error")
        );
        if let Some(symbol) = symbol {
            if detail.to_lowercase().contains("symbol") {
                return Err(ExchangeError::BadSymbol {
                    exchange: "htx",
                    symbol: symbol.to_string(),
                    detail,
                });
            }
        }
        Err(ExchangeError::Exchange {
            exchange: "htx",
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
        symbol.replace('/', "").to_lowercase()
    }
}

impl Default for Htx {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeConnector for Htx {
    fn id(&self) -> &'static str {
        "htx"
    }

    fn timeframes(&self) -> Option<&'static [(&'static str, &'static str)]> {
        Some(TIMEFRAMES)
    }

    fn markets(&self) -> Option<&[Market]> {
        self.markets.as_deref()
    }

    async fn load_markets(&mut self) -> Result<(), ExchangeError> {
        let url = format!("{}/v1/common/symbols", BASE_URL);
        let (_, body) = get_json(&self.client, self.id(), &url).await?;
        Self::check_status(&body, None)?;

        let markets = body["data"]
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let native_id = entry["symbol"].as_str()?;
                        let base = entry["base-currency"].as_str()?;
                        let quote = entry["quote-currency"].as_str()?;
                        Some(Market {
                            symbol: format!(
                                "{}/{}",
                                base.to_uppercase(),
                                quote.to_uppercase()
                            ),
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
        let period =
            crate::exchange::connector::venue_interval(TIMEFRAMES, timeframe, self.id())?;

        let url = format!(
            "{}/market/history/kline?symbol={}&period={}&size={}",
            BASE_URL,
            self.native_id(symbol),
            period,
            params.limit.min(2000)
        );

        let (_, body) = get_json(&self.client, self.id(), &url).await?;
        Self::check_status(&body, Some(symbol))?;

        let mut candles = normalize_rows(&body["data"]);
        if let Some(since) = params.since {
            candles.retain(|row| {
                row.first()
                    .and_then(crate::exchange::connector::as_i64)
                    .map(|ts| ts >= since)
                    .unwrap_or(true)
            });
        }
        Ok(candles)
    }

    async fn close(&mut self) {
        self.markets = None;
    }
}

/// Turn newest-first candle objects into ascending common-order rows
fn normalize_rows(data: &Value) -> Vec<RawCandle> {
    data.as_array()
        .map(|rows| {
            rows.iter()
                .rev()
                .filter_map(|row| {
                    let ts_ms = row["id"].as_i64()? * 1000;
                    Some(vec![
                        Value::from(ts_ms),
                        row["open"].clone(),
                        row["high"].clone(),
                        row["low"].clone(),
                        row["close"].clone(),
                        row["amount"].clone(),
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
    fn test_objects_become_ascending_rows() {
        let data = json!([
            {"id": 1700003600, "open": 2.0, "close": 2.5, "low": 1.0, "high": 3.0, "amount": 10.0, "vol": 25.0},
            {"id": 1700000000, "open": 1.0, "close": 1.5, "low": 0.5, "high": 2.0, "amount": 11.0, "vol": 16.0}
        ]);
        let candles = normalize_rows(&data);
        assert_eq!(candles[0][0], json!(1700000000000i64));
        assert_eq!(candles[0][1], json!(1.0));
        assert_eq!(candles[0][2], json!(2.0)); // high
        assert_eq!(candles[0][5], json!(11.0)); // amount as base volume
        assert_eq!(candles[1][0], json!(1700003600000i64));
    }

    #[test]
    fn test_invalid_symbol_maps_to_bad_symbol() {
        let body = json!({"status": "error", "err-code": "invalid-parameter", "err-msg": "invalid symbol"});
        let err = Htx::check_status(&body, Some("FOO/USDT")).unwrap_err();
        assert!(matches!(err, ExchangeError::BadSymbol { .. }));
    }

    #[test]
    fn test_native_id_fallback() {
        assert_eq!(Htx::new().native_id("BTC/USDT"), "btcusdt");
    }
}
