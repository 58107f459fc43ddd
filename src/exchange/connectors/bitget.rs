//! Bitget spot connector
//!
//! Markets from `/api/v2/spot/public/symbols`, candles from
//! `/api/v2/spot/market/candles`. Bitget already returns candles ascending
//! with millisecond timestamps; only the trailing volume columns are trimmed.

use async_trait::async_trait;
use serde_json::Value;

use crate::exchange::connector::{get_json, http_client, ExchangeConnector, Market, RawCandle};
use crate::exchange::errors::ExchangeError;
use crate::exchange::klines::FetchParams;

const BASE_URL: &str = "https://api.bitget.com";

const TIMEFRAMES: &[(&str, &str)] = &[
    ("1m", "1min"),
    ("5m", "5min"),
    ("15m", "15min"),
    ("30m", "30min"),
    ("1h", "1h"),
    ("4h", "4h"),
    ("6h", "6h"),
    ("12h", "12h"),
    ("1d", "1day"),
    ("1w", "1week"),
];

pub struct Bitget {
    client: reqwest::Client,
    markets: Option<Vec<Market>>,
}

impl Bitget {
    pub fn new() -> Self {
        Self {
            client: http_client(),
            markets: None,
        }
    }

    fn unwrap_data(body: Value, symbol: Option<&str>) -> Result<Value, ExchangeError> {
        let code = body["code"].as_str().unwrap_or_default();
        if code == "00000" {
            return Ok(body["data"].clone());
        }
        let detail = format!(
            "{}: {}",
            code,
            body["msg"].as_str().unwrap_or("unknown error")
        );
        if let Some(symbol) = symbol {
            let lowered = detail.to_lowercase();
            if lowered.contains("symbol") || lowered.contains("does not exist") {
                return Err(ExchangeError::BadSymbol {
                    exchange: "bitget",
                    symbol: symbol.to_string(),
                    detail,
                });
            }
        }
        Err(ExchangeError::Exchange {
            exchange: "bitget",
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

impl Default for Bitget {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeConnector for Bitget {
    fn id(&self) -> &'static str {
        "bitget"
    }

    fn timeframes(&self) -> Option<&'static [(&'static str, &'static str)]> {
        Some(TIMEFRAMES)
    }

    fn markets(&self) -> Option<&[Market]> {
        self.markets.as_deref()
    }

    async fn load_markets(&mut self) -> Result<(), ExchangeError> {
        let url = format!("{}/api/v2/spot/public/symbols", BASE_URL);
        let (_, body) = get_json(&self.client, self.id(), &url).await?;
        let data = Self::unwrap_data(body, None)?;

        let markets = data
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let native_id = entry["symbol"].as_str()?;
                        let base = entry["baseCoin"].as_str()?;
                        let quote = entry["quoteCoin"].as_str()?;
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
        let granularity =
            crate::exchange::connector::venue_interval(TIMEFRAMES, timeframe, self.id())?;

        let mut url = format!(
            "{}/api/v2/spot/market/candles?symbol={}&granularity={}&limit={}",
            BASE_URL,
            self.native_id(symbol),
            granularity,
            params.limit.min(1000)
        );
        if let Some(since) = params.since {
            url.push_str(&format!("&startTime={}", since));
        }

        let (_, body) = get_json(&self.client, self.id(), &url).await?;
        let data = Self::unwrap_data(body, Some(symbol))?;

        Ok(normalize_rows(&data))
    }

    async fn close(&mut self) {
        self.markets = None;
    }
}

/// Trim ascending `[ts_ms, o, h, l, c, baseVol, usdtVol, quoteVol]` rows to six columns
fn normalize_rows(data: &Value) -> Vec<RawCandle> {
    data.as_array()
        .map(|rows| {
            rows.iter()
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
    fn test_rows_trimmed_to_six_columns() {
        let data = json!([["1700000000000", "1", "2", "0.5", "1.5", "10", "15000", "15"]]);
        let candles = normalize_rows(&data);
        assert_eq!(candles[0].len(), 6);
        assert_eq!(candles[0][0], json!(1700000000000i64));
        assert_eq!(candles[0][5], json!("10"));
    }

    #[test]
    fn test_symbol_error_mapping() {
        let body = json!({"code": "40034", "msg": "Parameter BTCXXX does not exist"});
        let err = Bitget::unwrap_data(body, Some("BTC/XXX")).unwrap_err();
        assert!(matches!(err, ExchangeError::BadSymbol { .. }));
    }

    #[test]
    fn test_native_id_fallback() {
        assert_eq!(Bitget::new().native_id("BTC/USDT"), "BTCUSDT");
    }
}
