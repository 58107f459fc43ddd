//! Kline shaper
//!
//! Converts raw venue candle rows into the fixed six-field [`Kline`] record and
//! implements the limit/since defaulting policy for history requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::connector::{as_f64, as_i64, ExchangeConnector, RawCandle};
use super::errors::ExchangeError;

/// One candlestick: timestamp in milliseconds UTC plus OHLCV as floats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Kline {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Effective fetch parameters after defaulting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchParams {
    pub limit: u32,
    pub since: Option<i64>,
}

/// Default number of candles when neither `limit` nor `since` is given
const DEFAULT_LIMIT: u32 = 200;

/// Default number of candles when `since` is given without `limit`
const DEFAULT_LIMIT_WITH_SINCE: u32 = 1500;

/// Apply the limit/since defaulting policy:
/// `since` set defaults `limit` to 1500, only `limit` passes through,
/// neither defaults `limit` to 200.
pub fn resolve_fetch_params(limit: Option<u32>, since: Option<i64>) -> FetchParams {
    match (since, limit) {
        (Some(s), l) => FetchParams {
            limit: l.unwrap_or(DEFAULT_LIMIT_WITH_SINCE),
            since: Some(s),
        },
        (None, Some(l)) => FetchParams {
            limit: l,
            since: None,
        },
        (None, None) => FetchParams {
            limit: DEFAULT_LIMIT,
            since: None,
        },
    }
}

/// Fetch and shape candles for one symbol.
///
/// Market metadata is loaded lazily and tolerantly: the fetch may still work
/// without it, so a load failure is logged and ignored. The timeframe is
/// validated against the venue's advertised set when one exists.
pub async fn fetch_klines(
    connector: &mut dyn ExchangeConnector,
    symbol: &str,
    timeframe: &str,
    params: &FetchParams,
) -> Result<Vec<Kline>, ExchangeError> {
    if connector.markets().is_none() {
        if let Err(e) = connector.load_markets().await {
            tracing::warn!(
                "Could not load markets for {} during kline fetch (continuing anyway): {}",
                connector.id(),
                e
            );
        }
    }

    if let Some(table) = connector.timeframes() {
        if !table.iter().any(|(unified, _)| *unified == timeframe) {
            return Err(ExchangeError::BadTimeframe {
                exchange: connector.id(),
                requested: timeframe.to_string(),
                available: table.iter().map(|(unified, _)| *unified).collect(),
            });
        }
    }

    tracing::debug!(
        "Fetching OHLCV for {} {} {} with {:?}",
        connector.id(),
        symbol,
        timeframe,
        params
    );
    let rows = connector.fetch_ohlcv(symbol, timeframe, params).await?;
    let klines = shape_klines(symbol, rows);
    tracing::debug!(
        "Returning {} klines for {} from {}",
        klines.len(),
        symbol,
        connector.id()
    );
    Ok(klines)
}

/// Map raw rows into Klines, dropping short or unparseable rows with a
/// warning and preserving the order of the rest
pub fn shape_klines(symbol: &str, rows: Vec<RawCandle>) -> Vec<Kline> {
    rows.into_iter()
        .filter_map(|row| match shape_row(&row) {
            Some(kline) => Some(kline),
            None => {
                tracing::warn!(
                    "Incomplete kline data for {} at {}: {:?}",
                    symbol,
                    row.first().map(|v| v.to_string()).unwrap_or_default(),
                    row
                );
                None
            }
        })
        .collect()
}

fn shape_row(row: &[Value]) -> Option<Kline> {
    if row.len() < 6 {
        return None;
    }
    Some(Kline {
        timestamp: as_i64(&row[0])?,
        open: as_f64(&row[1])?,
        high: as_f64(&row[2])?,
        low: as_f64(&row[3])?,
        close: as_f64(&row[4])?,
        volume: as_f64(&row[5])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::connector::testing::MockConnector;
    use serde_json::json;

    fn row(ts: i64) -> RawCandle {
        vec![
            json!(ts),
            json!("100.0"),
            json!(110.0),
            json!(90.0),
            json!("105.5"),
            json!(12.25),
        ]
    }

    #[test]
    fn test_param_policy_since_defaults_limit_to_1500() {
        let params = resolve_fetch_params(None, Some(1_700_000_000_000));
        assert_eq!(params.limit, 1500);
        assert_eq!(params.since, Some(1_700_000_000_000));
    }

    #[test]
    fn test_param_policy_limit_passes_through() {
        assert_eq!(resolve_fetch_params(Some(42), None).limit, 42);
        assert_eq!(
            resolve_fetch_params(Some(42), Some(1)).limit,
            42,
            "explicit limit wins even with since"
        );
    }

    #[test]
    fn test_param_policy_defaults_to_200() {
        let params = resolve_fetch_params(None, None);
        assert_eq!(params.limit, 200);
        assert_eq!(params.since, None);
    }

    #[test]
    fn test_shape_drops_short_rows_preserving_order() {
        let rows = vec![
            row(1),
            vec![json!(2), json!(1.0), json!(1.0)],
            row(3),
            vec![],
        ];
        let klines = shape_klines("BTC/USDT", rows);
        assert_eq!(klines.len(), 2);
        assert_eq!(klines[0].timestamp, 1);
        assert_eq!(klines[1].timestamp, 3);
    }

    #[test]
    fn test_shape_drops_unparseable_rows() {
        let mut bad = row(5);
        bad[4] = json!("not-a-number");
        let klines = shape_klines("BTC/USDT", vec![row(4), bad]);
        assert_eq!(klines.len(), 1);
        assert_eq!(klines[0].timestamp, 4);
    }

    #[test]
    fn test_shape_parses_mixed_numbers_and_strings() {
        let klines = shape_klines("BTC/USDT", vec![row(1_700_000_000_000)]);
        assert_eq!(
            klines[0],
            Kline {
                timestamp: 1_700_000_000_000,
                open: 100.0,
                high: 110.0,
                low: 90.0,
                close: 105.5,
                volume: 12.25,
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_rejects_unsupported_timeframe() {
        let mut connector = MockConnector::with_markets(vec![]);
        let params = resolve_fetch_params(Some(5), None);
        let err = fetch_klines(&mut connector, "BTC/USDT", "7x", &params)
            .await
            .unwrap_err();
        match err {
            ExchangeError::BadTimeframe { available, .. } => {
                assert!(available.contains(&"1h"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_tolerates_metadata_failure() {
        let mut connector = MockConnector::failing_load(|| ExchangeError::Network {
            exchange: "mock",
            detail: "connect timeout".to_string(),
        });
        connector.candles = vec![row(1), row(2)];

        let params = resolve_fetch_params(None, None);
        let klines = fetch_klines(&mut connector, "BTC/USDT", "1h", &params)
            .await
            .unwrap();
        assert_eq!(klines.len(), 2);
    }
}
