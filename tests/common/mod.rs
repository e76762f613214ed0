#![allow(dead_code)]

use chrono::{DateTime, Duration, FixedOffset};
use marketdash::domain::error::{FetchError, FetchResult};
use marketdash::domain::fetch::Fetcher;
use marketdash::domain::history::PriceHistory;
use marketdash::domain::info::SecurityInfo;
pub use marketdash::domain::ohlcv::{Bar, Split};
use marketdash::domain::period::HistoryRequest;
use marketdash::domain::proxy::{ProxyRoute, ProxySelector};
use marketdash::domain::table::Table;
use marketdash::ports::quote_port::QuotePort;
use marketdash::ports::table_port::TablePort;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Call counters shared between a mock port and the test that owns it.
#[derive(Clone, Default)]
pub struct Calls {
    pub info: Arc<AtomicUsize>,
    pub history: Arc<AtomicUsize>,
    pub splits: Arc<AtomicUsize>,
    pub tables: Arc<AtomicUsize>,
}

impl Calls {
    pub fn info(&self) -> usize {
        self.info.load(Ordering::SeqCst)
    }

    pub fn history(&self) -> usize {
        self.history.load(Ordering::SeqCst)
    }

    pub fn splits(&self) -> usize {
        self.splits.load(Ordering::SeqCst)
    }

    pub fn tables(&self) -> usize {
        self.tables.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct MockQuotes {
    pub info: HashMap<String, Value>,
    pub bars: HashMap<String, Vec<Bar>>,
    pub splits: HashMap<String, Vec<Split>>,
    pub errors: HashMap<String, String>,
    pub history_errors: HashMap<String, String>,
    pub calls: Calls,
}

impl MockQuotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_security(mut self, ticker: &str, info: Value, bars: Vec<Bar>) -> Self {
        self.info.insert(ticker.to_string(), info);
        self.bars.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_splits(mut self, ticker: &str, splits: Vec<Split>) -> Self {
        self.splits.insert(ticker.to_string(), splits);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    /// Fails only the history lookup of `ticker`; its info still resolves.
    pub fn with_history_error(mut self, ticker: &str, reason: &str) -> Self {
        self.history_errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    fn failure(&self, ticker: &str) -> Option<FetchError> {
        self.errors.get(ticker).map(|reason| FetchError::Provider {
            ticker: ticker.to_string(),
            reason: reason.clone(),
        })
    }

    fn history_failure(&self, ticker: &str) -> Option<FetchError> {
        self.failure(ticker).or_else(|| {
            self.history_errors.get(ticker).map(|reason| FetchError::Provider {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            })
        })
    }
}

impl QuotePort for MockQuotes {
    fn fetch_info(&self, ticker: &str, _proxy: Option<&ProxyRoute>) -> FetchResult<SecurityInfo> {
        self.calls.info.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.failure(ticker) {
            return Err(e);
        }
        match self.info.get(ticker) {
            Some(Value::Object(map)) => Ok(SecurityInfo::new(map.clone())),
            _ => Err(FetchError::Provider {
                ticker: ticker.to_string(),
                reason: "Quote not found for ticker symbol".to_string(),
            }),
        }
    }

    fn fetch_history(
        &self,
        ticker: &str,
        _request: &HistoryRequest,
        _proxy: Option<&ProxyRoute>,
    ) -> FetchResult<PriceHistory> {
        self.calls.history.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.history_failure(ticker) {
            return Err(e);
        }
        Ok(PriceHistory::new(
            ticker,
            self.bars.get(ticker).cloned().unwrap_or_default(),
        ))
    }

    fn fetch_splits(&self, ticker: &str, _proxy: Option<&ProxyRoute>) -> FetchResult<Vec<Split>> {
        self.calls.splits.fetch_add(1, Ordering::SeqCst);
        Ok(self.splits.get(ticker).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MockTables {
    pub tables: HashMap<String, Table>,
    pub calls: Calls,
}

impl MockTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, url: &str, table: Table) -> Self {
        self.tables.insert(url.to_string(), table);
        self
    }
}

impl TablePort for MockTables {
    fn fetch_table(&self, url: &str, _proxy: Option<&ProxyRoute>) -> FetchResult<Table> {
        self.calls.tables.fetch_add(1, Ordering::SeqCst);
        self.tables
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NoTable { url: url.to_string() })
    }
}

/// Fetcher over the mocks with proxies disabled, plus the shared counters.
pub fn mock_fetcher(quotes: MockQuotes, tables: MockTables) -> (Fetcher, Calls) {
    let calls = Calls {
        info: Arc::clone(&quotes.calls.info),
        history: Arc::clone(&quotes.calls.history),
        splits: Arc::clone(&quotes.calls.splits),
        tables: Arc::clone(&tables.calls.tables),
    };
    let fetcher = Fetcher::new(Box::new(quotes), Box::new(tables), ProxySelector::disabled());
    (fetcher, calls)
}

pub fn ts(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

pub fn make_bar(day: i64, open: f64, close: f64, volume: u64) -> Bar {
    Bar {
        timestamp: ts("2024-01-01T00:00:00+05:30") + Duration::days(day),
        open,
        high: open.max(close) + 1.0,
        low: open.min(close) - 1.0,
        close,
        volume,
    }
}

/// `count` daily bars starting at `start_price`, moving by `step` per day.
pub fn generate_bars(count: usize, start_price: f64, step: f64) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let open = start_price + step * i as f64;
            let close = open + step;
            make_bar(i as i64, open, close, 1_000 + 10 * i as u64)
        })
        .collect()
}

pub fn equity_info(name: &str) -> Value {
    json!({
        "quoteType": "EQUITY",
        "shortName": name,
        "country": "India",
        "exchange": "NSI",
        "sector": "Consumer Cyclical",
        "industry": "Auto Manufacturers",
        "marketCap": 2_850_000_000_000_i64,
        "currency": "INR",
        "beta": 1.62,
        "currentPrice": 774.5
    })
}

pub fn etf_info(family: &str) -> Value {
    json!({
        "quoteType": "ETF",
        "exchange": "PCX",
        "fundFamily": family,
        "category": "Large Blend",
        "totalAssets": 1_000_000_i64,
        "currency": "USD",
        "navPrice": 101.25
    })
}

pub fn security_info(value: Value) -> SecurityInfo {
    match value {
        Value::Object(map) => SecurityInfo::new(map),
        _ => panic!("expected a JSON object"),
    }
}
