//! KuCoin spot connector
//!
//! Markets come from `/api/v2/symbols`, candles from `/api/v1/market/candles`.
//! KuCoin returns candles newest-first as
//! `[time(sec), open, close, high, low, volume, turnover]` so rows are both
//! reversed and reordered into the common shape.

use async_trait::async_trait;
use serde_json::Value;

use crate::exchange::connector::{get_json, http_client, ExchangeConnector, Market, RawCandle};
use crate::exchange::errors::ExchangeError;
use crate::exchange::klines::FetchParams;

const BASE_URL: &str = "https://api.kucoin.com";

const TIMEFRAMES: &[(&str, &str)] = &[
    ("1m", "1min"),
    ("3m", "3min"),
    ("5m", "5min"),
    ("15m", "15min"),
    ("30m", "30min"),
    ("1h", "1hour"),
    ("2h", "2hour"),
    ("4h", "4hour"),
    ("6h", "6hour"),
    ("8h", "8hour"),
    ("12h", "12hour"),
    ("1d", "1day"),
    ("1w", "1week"),
];

pub struct Kucoin {
    client: reqwest::Client,
    markets: Option<Vec<Market>>,
}

impl Kucoin {
    pub fn new() -> Self {
        Self {
            client: http_client(),
            markets: None,
        }
    }

    /// Unwrap KuCoin's `{"code": "200000", "data": ...}` envelope
    fn unwrap_data(body: Value, symbol: Option<&str>) -> Result<Value, ExchangeError> {
        let code = body["code"].as_str().unwrap_or_default();
        if code == "200000" {
            return Ok(body["data"].clone());
        }
        let detail = format!(
            "{}: {}",
            code,
            body["msg"].as_str().unwrap_or("unknown error")
        );
        let lowered = detail.to_lowercase();
        if let Some(symbol) = symbol {
            if lowered.contains("symbol") || lowered.contains("pair") {
                return Err(ExchangeError::BadSymbol {
                    exchange: "kucoin",
                    symbol: symbol.to_string(),
                    detail,
                });
            }
        }
        Err(ExchangeError::Exchange {
            exchange: "kucoin",
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

impl Default for Kucoin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeConnector for Kucoin {
    fn id(&self) -> &'static str {
        "kucoin"
    }

    fn timeframes(&self) -> Option<&'static [(&'static str, &'static str)]> {
        Some(TIMEFRAMES)
    }

    fn markets(&self) -> Option<&[Market]> {
        self.markets.as_deref()
    }

    async fn load_markets(&mut self) -> Result<(), ExchangeError> {
        let url = format!("{}/api/v2/symbols", BASE_URL);
        let (_, body) = get_json(&self.client, self.id(), &url).await?;
        let data = Self::unwrap_data(body, None)?;

        let markets = data
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let native_id = entry["symbol"].as_str()?;
                        let base = entry["baseCurrency"].as_str()?;
                        let quote = entry["quoteCurrency"].as_str()?;
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
            "{}/api/v1/market/candles?symbol={}&type={}",
            BASE_URL,
            self.native_id(symbol),
            interval
        );
        if let Some(since) = params.since {
            url.push_str(&format!("&startAt={}", since / 1000));
        }

        let (_, body) = get_json(&self.client, self.id(), &url).await?;
        let data = Self::unwrap_data(body, Some(symbol))?;

        let mut candles = normalize_rows(&data);

        let limit = params.limit as usize;
        if candles.len() > limit {
            if params.since.is_some() {
                candles.truncate(limit);
            } else {
                candles.drain(..candles.len() - limit);
            }
        }
        Ok(candles)
    }

    async fn close(&mut self) {
        self.markets = None;
    }
}

/// Reverse newest-first rows `[time(sec), open, close, high, low, volume, ...]`
/// into ascending common-order candles
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
                    let ts_ms = crate::exchange::connector::as_i64(&row[0])? * 1000;
                    Some(vec![
                        Value::from(ts_ms),
                        row[1].clone(),
                        row[3].clone(),
                        row[4].clone(),
                        row[2].clone(),
                        row[5].clone(),
                    ])
                })
                .collect()
        })
        .unwrap_or_default()
}
