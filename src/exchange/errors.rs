//! Error types for exchange operations
//!
//! Every venue connector maps its own error surface (transport failures, HTTP
//! statuses, venue error codes) into this taxonomy so the API layer can translate
//! failures into status codes without knowing venue specifics.

use thiserror::Error;

/// Errors that can occur while talking to an exchange
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The exchange id is not in the supported registry
    #[error("Exchange ID '{0}' is not supported or not found.")]
    UnknownExchange(String),

    /// Transport-level failure reaching the exchange (DNS, connect, timeout)
    #[error("Network error connecting to {exchange}: {detail}")]
    Network {
        exchange: &'static str,
        detail: String,
    },

    /// The trading pair is unknown or invalid on this venue
    #[error("Symbol '{symbol}' not found or invalid on {exchange}. Details: {detail}")]
    BadSymbol {
        exchange: &'static str,
        symbol: String,
        detail: String,
    },

    /// The requested timeframe is not in the venue's advertised set
    #[error("Timeframe '{requested}' not supported by {exchange}. Available: {available:?}")]
    BadTimeframe {
        exchange: &'static str,
        requested: String,
        available: Vec<&'static str>,
    },

    /// The venue answered but reported itself unavailable (5xx, maintenance)
    #[error("Exchange {exchange} temporarily unavailable: {detail}")]
    Unavailable {
        exchange: &'static str,
        detail: String,
    },

    /// Any other venue-side error (bad response body, rejected request)
    #[error("Exchange error from {exchange}: {detail}")]
    Exchange {
        exchange: &'static str,
        detail: String,
    },
}

impl ExchangeError {
    /// Returns true for errors callers may not want to surface as a hard
    /// failure on symbol listing (the venue answered, just not usefully)
    pub fn is_exchange_side(&self) -> bool {
        matches!(
            self,
            ExchangeError::Unavailable { .. } | ExchangeError::Exchange { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_exchange_names_the_id() {
        let err = ExchangeError::UnknownExchange("doesnotexist".to_string());
        assert!(err.to_string().contains("doesnotexist"));
    }

    #[test]
    fn test_bad_timeframe_lists_available() {
        let err = ExchangeError::BadTimeframe {
            exchange: "kraken",
            requested: "7x".to_string(),
            available: vec!["1m", "1h", "1d"],
        };
        let msg = err.to_string();
        assert!(msg.contains("7x"));
        assert!(msg.contains("1h"));
    }

    #[test]
    fn test_exchange_side_classification() {
        assert!(ExchangeError::Unavailable {
            exchange: "okx",
            detail: "maintenance".to_string()
        }
        .is_exchange_side());
        assert!(!ExchangeError::Network {
            exchange: "okx",
            detail: "timeout".to_string()
        }
        .is_exchange_side());
    }
}
