//! OKX spot connector
//!
//! Instruments from `/api/v5/public/instruments?instType=SPOT`, candles from
//! `/api/v5/market/candles`. OKX wraps everything in
//! `{"code": "0", "msg": "", "data": [...]}` and returns candles newest-first
//! with extra volume columns after the first six.

use async_trait::async_trait;
use serde_json::Value;

use crate::exchange::connector::{get_json, http_client, ExchangeConnector, Market, RawCandle};
use crate::exchange::errors::ExchangeError;
use crate::exchange::klines::FetchParams;

const BASE_URL: &str = "https://www.okx.com";

/// Hour-and-above bars are uppercase on OKX
const TIMEFRAMES: &[(&str, &str)] = &[
    ("1m", "1m"),
    ("3m", "3m"),
    ("5m", "5m"),
    ("15m", "15m"),
    ("30m", "30m"),
    ("1h", "1H"),
    ("2h", "2H"),
    ("4h", "4H"),
    ("6h", "6H"),
    ("12h", "12H"),
    ("1d", "1D"),
    ("1w", "1W"),
];

pub struct Okx {
    client: reqwest::Client,
    markets: Option<Vec<Market>>,
}

impl Okx {
    pub fn new() -> Self {
        Self {
            client: http_client(),
            markets: None,
        }
    }

    fn unwrap_data(body: Value, symbol: Option<&str>) -> Result<Value, ExchangeError> {
        let code = body["code"].as_str().unwrap_or_default();
        if code == "0" {
            return Ok(body["data"].clone());
        }
        let detail = format!(
            "{}: {}",
            code,
            body["msg"].as_str().unwrap_or("unknown error")
        );
        if let Some(symbol) = symbol {
            // 51001: instrument ID does not exist
            if code == "51001" || detail.to_lowercase().contains("instrument") {
                return Err(ExchangeError::BadSymbol {
                    exchange: "okx",
                    symbol: symbol.to_string(),
                    detail,
                });
            }
        }
        Err(ExchangeError::Exchange {
            exchange: "okx",
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
        symbol.replace('/', "-")
    }
}

impl Default for Okx {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeConnector for Okx {
    fn id(&self) -> &'static str {
        "okx"
    }

    fn timeframes(&self) -> Option<&'static [(&'static str, &'static str)]> {
        Some(TIMEFRAMES)
    }

    fn markets(&self) -> Option<&[Market]> {
        self.markets.as_deref()
    }

    async fn load_markets(&mut self) -> Result<(), ExchangeError> {
        let url = format!("{}/api/v5/public/instruments?instType=SPOT", BASE_URL);
        let (_, body) = get_json(&self.client, self.id(), &url).await?;
        let data = Self::unwrap_data(body, None)?;

        let markets = data
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let native_id = entry["instId"].as_str()?;
                        let base = entry["baseCcy"].as_str()?;
                        let quote = entry["quoteCcy"].as_str()?;
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
        let bar = crate::exchange::connector::venue_interval(TIMEFRAMES, timeframe, self.id())?;

        // The venue caps a single page at 300 rows
        let mut url = format!(
            "{}/api/v5/market/candles?instId={}&bar={}&limit={}",
            BASE_URL,
            self.native_id(symbol),
            bar,
            params.limit.min(300)
        );
        if let Some(since) = params.since {
            // `before` returns records newer than the given timestamp
            url.push_str(&format!("&before={}", since - 1));
        }

        let (_, body) = get_json(&self.client, self.id(), &url).await?;
        let data = Self::unwrap_data(body, Some(symbol))?;

        Ok(normalize_rows(&data))
    }

    async fn close(&mut self) {
        self.markets = None;
    }
}

/// Reverse newest-first rows and trim trailing volume columns
fn normalize_rows(data: &Value) -> Vec<RawCandle> {
    data.as_array()
        .map(|rows| {
            rows.iter()
                .rev()
                .filter_map(|row| {
                    let row = row.as_array()?;
                    if row.len() < 6 {
                        return Some(row.clone());
                    }
                    let ts_ms = crate::exchange::connector::as_i64(&row[0])?;
                    let mut candle = vec![Value::from(ts_ms)];
                    candle.extend(row[1..6].iter().cloned());
                    Some(candle)
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
    fn test_rows_reversed_and_trimmed() {
        let data = json!([
            ["1700003600000", "2", "3", "1", "2.5", "10", "extra", "extra", "1"],
            ["1700000000000", "1", "2", "0.5", "1.5", "11", "extra", "extra", "1"]
        ]);
        let candles = normalize_rows(&data);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].len(), 6);
        assert_eq!(candles[0][0], json!(1700000000000i64));
        assert_eq!(candles[1][0], json!(1700003600000i64));
        assert_eq!(candles[1][5], json!("10"));
    }

    #[test]
    fn test_unknown_instrument_maps_to_bad_symbol() {
        let body = json!({"code": "51001", "msg": "Instrument ID does not exist"});
        let err = Okx::unwrap_data(body, Some("FOO/USDT")).unwrap_err();
        assert!(matches!(err, ExchangeError::BadSymbol { .. }));
    }

    #[test]
    fn test_native_id_fallback() {
        assert_eq!(Okx::new().native_id("BTC/USDT"), "BTC-USDT");
    }
}
