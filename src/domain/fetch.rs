//! Memoized fetch operations.
//!
//! [`Fetcher`] owns the quote and table ports, the proxy selector and one
//! [`Memo`] per operation. Every operation returns a shared
//! `Arc<FetchResult<T>>`; identical arguments return the identical object
//! until the entry is cleared.

use crate::domain::error::FetchResult;
use crate::domain::history::PriceHistory;
use crate::domain::info::SecurityInfo;
use crate::domain::memo::Memo;
use crate::domain::ohlcv::Split;
use crate::domain::period::HistoryRequest;
use crate::domain::proxy::ProxySelector;
use crate::domain::table::Table;
use crate::ports::quote_port::QuotePort;
use crate::ports::table_port::TablePort;
use std::sync::Arc;

pub struct Fetcher {
    quotes: Box<dyn QuotePort>,
    tables: Box<dyn TablePort>,
    proxies: ProxySelector,
    info: Memo<SecurityInfo>,
    history: Memo<PriceHistory>,
    splits: Memo<Vec<Split>>,
    table: Memo<Table>,
}

impl Fetcher {
    pub fn new(
        quotes: Box<dyn QuotePort>,
        tables: Box<dyn TablePort>,
        proxies: ProxySelector,
    ) -> Self {
        Self {
            quotes,
            tables,
            proxies,
            info: Memo::new("fetch_info"),
            history: Memo::new("fetch_history"),
            splits: Memo::new("fetch_splits"),
            table: Memo::new("fetch_table"),
        }
    }

    pub fn fetch_info(&self, ticker: &str) -> Arc<FetchResult<SecurityInfo>> {
        self.info.get_or_fetch(&(ticker,), || {
            let proxy = self.proxies.select()?;
            self.quotes.fetch_info(ticker, proxy.as_ref())
        })
    }

    pub fn fetch_history(
        &self,
        ticker: &str,
        request: &HistoryRequest,
    ) -> Arc<FetchResult<PriceHistory>> {
        self.history.get_or_fetch(&(ticker, request), || {
            let proxy = self.proxies.select()?;
            self.quotes.fetch_history(ticker, request, proxy.as_ref())
        })
    }

    pub fn fetch_splits(&self, ticker: &str) -> Arc<FetchResult<Vec<Split>>> {
        self.splits.get_or_fetch(&(ticker,), || {
            let proxy = self.proxies.select()?;
            self.quotes.fetch_splits(ticker, proxy.as_ref())
        })
    }

    /// Table fetches always go through a freshly acquired proxy.
    pub fn fetch_table(&self, url: &str) -> Arc<FetchResult<Table>> {
        self.table.get_or_fetch(&(url,), || {
            let proxy = self.proxies.acquire(true)?;
            self.tables.fetch_table(url, proxy.as_ref())
        })
    }

    pub fn clear_info(&self, ticker: &str) -> bool {
        self.info.clear(&(ticker,))
    }

    pub fn clear_history(&self, ticker: &str, request: &HistoryRequest) -> bool {
        self.history.clear(&(ticker, request))
    }

    pub fn clear_splits(&self, ticker: &str) -> bool {
        self.splits.clear(&(ticker,))
    }

    pub fn clear_table(&self, url: &str) -> bool {
        self.table.clear(&(url,))
    }

    /// Refresh: drops every memoized result.
    pub fn clear_all(&self) {
        log::info!("clearing all memoized fetch results");
        self.info.clear_all();
        self.history.clear_all();
        self.splits.clear_all();
        self.table.clear_all();
    }

    /// Number of cached entries across all operations.
    pub fn cached_entries(&self) -> usize {
        self.info.len() + self.history.len() + self.splits.len() + self.table.len()
    }
}
