//! Ticker list parsing and validation.
//!
//! Input is a comma-separated list. Parsing trims, drops empty tokens and
//! de-duplicates while preserving first-occurrence order, then keeps at most
//! [`MAX_TICKERS`]. Validation fetches metadata for each candidate and keeps
//! the ones whose quote type is supported; a rejected ticker never aborts the
//! batch.

use crate::domain::error::FetchError;
use crate::domain::fetch::Fetcher;
use std::collections::HashSet;
use std::fmt;

pub const MAX_TICKERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTickers {
    pub tickers: Vec<String>,
    /// Distinct tickers beyond the limit that were dropped.
    pub dropped: usize,
}

impl ParsedTickers {
    pub fn truncated(&self) -> bool {
        self.dropped > 0
    }
}

pub fn parse_tickers(input: &str) -> ParsedTickers {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() || !seen.insert(trimmed) {
            continue;
        }
        tickers.push(trimmed.to_string());
    }

    let dropped = tickers.len().saturating_sub(MAX_TICKERS);
    tickers.truncate(MAX_TICKERS);
    ParsedTickers { tickers, dropped }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    Fetch(FetchError),
    UnsupportedQuoteType(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedTicker {
    pub ticker: String,
    pub reason: RejectReason,
}

impl fmt::Display for RejectedTicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            RejectReason::Fetch(e) => write!(f, "{}", e),
            RejectReason::UnsupportedQuoteType(tag) => {
                write!(f, "{} has an invalid quoteType ({})", self.ticker, tag)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickerValidation {
    pub valid: Vec<String>,
    pub rejected: Vec<RejectedTicker>,
}

/// Keeps tickers whose metadata carries a supported quote type.
///
/// A failed metadata fetch clears its memo entry so the next render
/// retries instead of replaying the cached failure.
pub fn validate_tickers(fetcher: &Fetcher, tickers: &[String]) -> TickerValidation {
    let mut result = TickerValidation::default();

    for ticker in tickers {
        let info = fetcher.fetch_info(ticker);
        match info.as_ref() {
            Err(e) => {
                log::warn!("skipping {} ({})", ticker, e);
                fetcher.clear_info(ticker);
                result.rejected.push(RejectedTicker {
                    ticker: ticker.clone(),
                    reason: RejectReason::Fetch(e.clone()),
                });
            }
            Ok(info) => match info.quote_type() {
                Some(qt) if qt.is_supported() => result.valid.push(ticker.clone()),
                _ => {
                    let tag = info.quote_type_tag().to_string();
                    log::warn!("skipping {} (quoteType {:?})", ticker, tag);
                    result.rejected.push(RejectedTicker {
                        ticker: ticker.clone(),
                        reason: RejectReason::UnsupportedQuoteType(tag),
                    });
                }
            },
        }
    }

    result
}
