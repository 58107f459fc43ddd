//! Symbol normalizer
//!
//! Filters a venue's full market list down to simple spot pairs quoted in a
//! fixed currency set, excluding anything that looks like a derivative.

use super::connector::ExchangeConnector;
use super::errors::ExchangeError;

/// Quote currencies a pair must be denominated in to be listed
const ACCEPTED_QUOTES: &[&str] = &["/USDT", "/USD", "/BTC", "/ETH", "/EUR"];

/// Substrings marking a derivative contract, matched case-insensitively
const DERIVATIVE_MARKERS: &[&str] = &["SWAP", "PERP", "FUTURE"];

/// Returned as a single-element list when no pair survives filtering.
/// Callers must treat this as a display message, not data.
pub const NO_PAIRS_SENTINEL: &str = "No matching pairs on this exchange";

/// List the simple spot pairs of a venue, sorted ascending.
///
/// Loads market metadata first; unlike the kline path, a metadata failure here
/// fails the whole request. An empty result becomes the sentinel list.
pub async fn list_symbols(
    connector: &mut dyn ExchangeConnector,
) -> Result<Vec<String>, ExchangeError> {
    connector.load_markets().await?;

    let mut symbols: Vec<String> = connector
        .markets()
        .unwrap_or_default()
        .iter()
        .filter(|m| !m.derivative && is_simple_spot_pair(&m.symbol))
        .map(|m| m.symbol.clone())
        .collect();
    symbols.sort();

    if symbols.is_empty() {
        symbols.push(NO_PAIRS_SENTINEL.to_string());
    }
    Ok(symbols)
}

/// True for plain spot pairs quoted in an accepted currency
fn is_simple_spot_pair(symbol: &str) -> bool {
    if !ACCEPTED_QUOTES.iter().any(|q| symbol.ends_with(q)) {
        return false;
    }
    if symbol.contains(':') {
        return false;
    }
    let upper = symbol.to_uppercase();
    !DERIVATIVE_MARKERS.iter().any(|m| upper.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::connector::testing::MockConnector;
    use crate::exchange::connector::Market;

    fn market(symbol: &str) -> Market {
        Market {
            symbol: symbol.to_string(),
            native_id: symbol.replace('/', ""),
            derivative: false,
        }
    }

    #[test]
    fn test_accepts_spot_pairs_in_quote_set() {
        assert!(is_simple_spot_pair("BTC/USDT"));
        assert!(is_simple_spot_pair("ETH/BTC"));
        assert!(is_simple_spot_pair("SOL/EUR"));
    }

    #[test]
    fn test_rejects_foreign_quotes_and_derivatives() {
        assert!(!is_simple_spot_pair("BTC/JPY"));
        assert!(!is_simple_spot_pair("BTC/USDT:USDT"));
        assert!(!is_simple_spot_pair("BTC-PERP/USD"));
        assert!(!is_simple_spot_pair("btc-swap/USDT"));
        assert!(!is_simple_spot_pair("ETHFUTUREQ1/USD"));
    }

    #[tokio::test]
    async fn test_list_symbols_filters_and_sorts() {
        let mut connector = MockConnector::with_markets(vec![
            market("ETH/USDT"),
            market("BTC/USDT"),
            market("BTC/JPY"),
            market("BTC/USDT:USDT"),
            Market {
                symbol: "DOGE/USDT".to_string(),
                native_id: "DOGEUSDT".to_string(),
                derivative: true,
            },
        ]);

        let symbols = list_symbols(&mut connector).await.unwrap();
        assert_eq!(symbols, vec!["BTC/USDT", "ETH/USDT"]);
    }

    #[tokio::test]
    async fn test_empty_result_returns_sentinel() {
        let mut connector = MockConnector::with_markets(vec![market("BTC/JPY")]);
        let symbols = list_symbols(&mut connector).await.unwrap();
        assert_eq!(symbols, vec![NO_PAIRS_SENTINEL.to_string()]);
    }

    #[tokio::test]
    async fn test_metadata_failure_fails_the_request() {
        let mut connector = MockConnector::failing_load(|| ExchangeError::Unavailable {
            exchange: "mock",
            detail: "maintenance".to_string(),
        });
        let err = list_symbols(&mut connector).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Unavailable { .. }));
    }
}
