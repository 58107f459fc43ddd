//! Exchange-data layer: registry, connectors, symbol normalizer, kline shaper

pub mod connector;
pub mod connectors;
pub mod errors;
pub mod klines;
pub mod registry;
pub mod symbols;

pub use connector::{ExchangeConnector, Market, RawCandle};
pub use errors::ExchangeError;
pub use klines::{fetch_klines, resolve_fetch_params, FetchParams, Kline};
pub use registry::{display_name, resolve, SUPPORTED_EXCHANGES};
pub use symbols::{list_symbols, NO_PAIRS_SENTINEL};
