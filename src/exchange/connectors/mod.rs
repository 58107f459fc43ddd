//! Per-venue connector implementations
//!
//! Each file maps one venue's public REST surface onto the
//! [`ExchangeConnector`](crate::exchange::connector::ExchangeConnector) trait.

pub mod bitget;
pub mod gateio;
pub mod htx;
pub mod kraken;
pub mod kucoin;
pub mod mexc;
pub mod okx;

pub use bitget::Bitget;
pub use gateio::Gateio;
pub use htx::Htx;
pub use kraken::Kraken;
pub use kucoin::Kucoin;
pub use mexc::Mexc;
pub use okx::Okx;
