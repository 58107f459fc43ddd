//! Kraken spot connector
//!
//! Public endpoints only: `/0/public/AssetPairs` for markets and
//! `/0/public/OHLC` for candles. Kraken wraps every response in
//! `{"error": [...], "result": {...}}` and uses legacy asset codes
//! (XBT for BTC, XDG for DOGE) which are translated to unified form.

use async_trait::async_trait;
use serde_json::Value;

use crate::exchange::connector::{get_json, http_client, ExchangeConnector, Market, RawCandle};
use crate::exchange::errors::ExchangeError;
use crate::exchange::klines::FetchParams;

const BASE_URL: &str = "https://api.kraken.com";

/// Unified timeframe -> interval in minutes
const TIMEFRAMES: &[(&str, &str)] = &[
    ("1m", "1"),
    ("5m", "5"),
    ("15m", "15"),
    ("30m", "30"),
    ("1h", "60"),
    ("4h", "240"),
    ("1d", "1440"),
    ("1w", "10080"),
];

pub struct Kraken {
    client: reqwest::Client,
    markets: Option<Vec<Market>>,
}

impl Kraken {
    pub fn new() -> Self {
        Self {
            client: http_client(),
            markets: None,
        }
    }

    /// Unwrap Kraken's `{"error": [], "result": ...}` envelope
    fn unwrap_result(body: Value) -> Result<Value, ExchangeError> {
        if let Some(first) = body["error"].as_array().and_then(|e| e.first()) {
            let detail = first.as_str().unwrap_or("unknown error").to_string();
            return Err(map_kraken_error(detail));
        }
        Ok(body["result"].clone())
    }

    fn native_id(&self, symbol: &str) -> String {
        if let Some(markets) = &self.markets {
            if let Some(m) = markets.iter().find(|m| m.symbol == symbol) {
                return m.native_id.clone();
            }
        }
        // Best effort when metadata is missing
        to_kraken_asset(symbol).replace('/', "")
    }
}

impl Default for Kraken {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeConnector for Kraken {
    fn id(&self) -> &'static str {
        "kraken"
    }

    fn timeframes(&self) -> Option<&'static [(&'static str, &'static str)]> {
        Some(TIMEFRAMES)
    }

    fn markets(&self) -> Option<&[Market]> {
        self.markets.as_deref()
    }

    async fn load_markets(&mut self) -> Result<(), ExchangeError> {
        let url = format!("{}/0/public/AssetPairs", BASE_URL);
        let (_, body) = get_json(&self.client, self.id(), &url).await?;
        let result = Self::unwrap_result(body)?;

        let pairs = result.as_object().ok_or_else(|| ExchangeError::Exchange {
            exchange: self.id(),
            detail: "AssetPairs result is not an object".to_string(),
        })?;

        let markets = pairs
            .iter()
            .filter_map(|(native_id, info)| {
                // Darkpool pairs carry a ".d" suffix and no wsname
                let wsname = info["wsname"].as_str()?;
                Some(Market {
                    symbol: from_kraken_pair(wsname),
                    native_id: native_id.clone(),
                    derivative: false,
                })
            })
            .collect();
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
        let pair = self.native_id(symbol);

        let mut url = format!(
            "{}/0/public/OHLC?pair={}&interval={}",
            BASE_URL, pair, interval
        );
        if let Some(since) = params.since {
            // Kraken takes since in seconds
            url.push_str(&format!("&since={}", since / 1000));
        }

        let (_, body) = get_json(&self.client, self.id(), &url).await?;
        let result = Self::unwrap_result(body).map_err(|e| match e {
            ExchangeError::Exchange { detail, .. }
                if detail.contains("Unknown asset pair") =>
            {
                ExchangeError::BadSymbol {
                    exchange: "kraken",
                    symbol: symbol.to_string(),
                    detail,
                }
            }
            other => other,
        })?;

        // Rows live under the (venue-spelled) pair key, ascending:
        // [time(sec), open, high, low, close, vwap, volume, count]
        let rows = result
            .as_object()
            .and_then(|o| o.iter().find(|(k, _)| *k != "last").map(|(_, v)| v))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut candles: Vec<RawCandle> = rows
            .iter()
            .filter_map(|row| {
                let row = row.as_array()?;
                if row.len() < 7 {
                    return Some(row.clone());
                }
                let ts_ms = row[0].as_i64().map(|s| s * 1000)?;
                Some(vec![
                    Value::from(ts_ms),
                    row[1].clone(),
                    row[2].clone(),
                    row[3].clone(),
                    row[4].clone(),
                    row[6].clone(),
                ])
            })
            .collect();

        // Kraken has no limit parameter; trim most-recent-last unless the
        // caller anchored the window with `since`
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

fn map_kraken_error(detail: String) -> ExchangeError {
    if detail.starts_with("EService") {
        ExchangeError::Unavailable {
            exchange: "kraken",
            detail,
        }
    } else {
        ExchangeError::Exchange {
            exchange: "kraken",
            detail,
        }
    }
}

/// "XBT/USD" -> "BTC/USD"
fn from_kraken_pair(wsname: &str) -> String {
    wsname
        .split('/')
        .map(from_kraken_code)
        .collect::<Vec<_>>()
        .join("/")
}

fn from_kraken_code(code: &str) -> &str {
    match code {
        "XBT" => "BTC",
        "XDG" => "DOGE",
        other => other,
    }
}

fn to_kraken_asset(symbol: &str) -> String {
    symbol
        .split('/')
        .map(|code| match code {
            "BTC" => "XBT",
            "DOGE" => "XDG",
            other => other,
        })
        .collect::<Vec<_>>()
        .join("/")
}
