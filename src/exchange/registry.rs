//! Supported-exchange registry
//!
//! Fixed mapping of exchange ids to display names plus an explicit factory
//! resolving ids into connectors. Unknown ids are rejected with a typed error
//! instead of any dynamic lookup.

use super::connector::ExchangeConnector;
use super::connectors::{Bitget, Gateio, Htx, Kraken, Kucoin, Mexc, Okx};
use super::errors::ExchangeError;

/// The exchanges this service proxies, in display order
pub const SUPPORTED_EXCHANGES: &[(&str, &str)] = &[
    ("kucoin", "KuCoin"),
    ("gateio", "Gate.io"),
    ("okx", "OKX"),
    ("kraken", "Kraken"),
    ("htx", "HTX (Huobi)"),
    ("bitget", "Bitget"),
    ("mexc", "MEXC Global"),
];

/// Display name for a supported exchange id
pub fn display_name(exchange_id: &str) -> Option<&'static str> {
    SUPPORTED_EXCHANGES
        .iter()
        .find(|(id, _)| *id == exchange_id)
        .map(|(_, name)| *name)
}

/// Resolve an exchange id into a fresh connector scoped to one request.
///
/// The caller owns the connector and must call `close()` on every exit path.
pub fn resolve(exchange_id: &str) -> Result<Box<dyn ExchangeConnector>, ExchangeError> {
    match exchange_id {
        "kucoin" => Ok(Box::new(Kucoin::new())),
        "gateio" => Ok(Box::new(Gateio::new())),
        "okx" => Ok(Box::new(Okx::new())),
        "kraken" => Ok(Box::new(Kraken::new())),
        "htx" => Ok(Box::new(Htx::new())),
        "bitget" => Ok(Box::new(Bitget::new())),
        "mexc" => Ok(Box::new(Mexc::new())),
        other => Err(ExchangeError::UnknownExchange(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_registry_entry_resolves() {
        for (id, _) in SUPPORTED_EXCHANGES {
            let connector = resolve(id).unwrap();
            assert_eq!(connector.id(), *id);
        }
    }

    #[test]
    fn test_unknown_id_is_rejected() {
        let err = resolve("doesnotexist").err().unwrap();
        assert!(matches!(err, ExchangeError::UnknownExchange(_)));
        assert!(err.to_string().contains("doesnotexist"));
    }

    #[test]
    fn test_display_names() {
        assert_eq!(display_name("kraken"), Some("Kraken"));
        assert_eq!(display_name("htx"), Some("HTX (Huobi)"));
        assert_eq!(display_name("binance"), None);
    }
}
