//! Core domain types and logic.

pub mod error;
pub mod ohlcv;
pub mod history;
pub mod quote_type;
pub mod info;
pub mod table;
pub mod period;
pub mod indicator;
pub mod memo;
pub mod proxy;
pub mod fetch;
pub mod tickers;
pub mod session;
pub mod page;
pub mod overview;
pub mod chart;
pub mod settings;
pub mod config_validation;
