//! Offline fixture provider backed by files in a data directory.
//!
//! Layout, per ticker:
//! - `<TICKER>.json`: flat metadata object
//! - `<TICKER>.csv`: `date,open,high,low,close,volume`
//! - `<TICKER>.splits.csv`: `date,numerator,denominator` (optional)
//!
//! and `tables/<page>.csv` for scraped tables, where `<page>` is the last
//! path segment of the table URL without its extension.
//!
//! Periods are applied relative to the last row of the history file, so
//! fixtures stay stable as the calendar moves on. Proxy routes are ignored.

use crate::domain::error::{DashboardError, FetchError, FetchResult};
use crate::domain::history::PriceHistory;
use crate::domain::info::SecurityInfo;
use crate::domain::ohlcv::{Bar, Split};
use crate::domain::period::HistoryRequest;
use crate::domain::proxy::ProxyRoute;
use crate::domain::table::Table;
use crate::ports::config_port::ConfigPort;
use crate::ports::quote_port::QuotePort;
use crate::ports::table_port::TablePort;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    data_dir: PathBuf,
}

impl CsvAdapter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, DashboardError> {
        match config.get_string("provider", "data_dir") {
            Some(dir) if !dir.trim().is_empty() => Ok(Self::new(dir.trim())),
            _ => Err(DashboardError::ConfigMissing {
                section: "provider".to_string(),
                key: "data_dir".to_string(),
            }),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn ticker_path(&self, ticker: &str, suffix: &str) -> PathBuf {
        self.data_dir.join(format!("{}{}", ticker, suffix))
    }

    fn table_path(&self, url: &str) -> PathBuf {
        self.data_dir
            .join("tables")
            .join(format!("{}.csv", table_slug(url)))
    }
}

/// Last path segment of `url` without query or extension.
pub fn table_slug(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.trim_end_matches('/').rsplit('/').next().unwrap_or(path);
    match segment.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => segment.to_string(),
    }
}

fn read_file(path: &Path) -> Result<String, (ErrorKind, FetchError)> {
    fs::read_to_string(path).map_err(|e| {
        (
            e.kind(),
            FetchError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            },
        )
    })
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts);
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let utc = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?);
    Some(utc.fixed_offset())
}

fn field<'r>(
    record: &'r csv::StringRecord,
    idx: usize,
    name: &str,
    path: &Path,
) -> FetchResult<&'r str> {
    record.get(idx).map(str::trim).ok_or_else(|| FetchError::Io {
        path: path.display().to_string(),
        reason: format!("missing {} column", name),
    })
}

fn number<T: std::str::FromStr>(
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
    path: &Path,
) -> FetchResult<T> {
    let raw = field(record, idx, name, path)?;
    raw.parse().map_err(|_| FetchError::Io {
        path: path.display().to_string(),
        reason: format!("invalid {} value: {}", name, raw),
    })
}

fn timestamp(record: &csv::StringRecord, path: &Path) -> FetchResult<DateTime<FixedOffset>> {
    let raw = field(record, 0, "date", path)?;
    parse_timestamp(raw).ok_or_else(|| FetchError::Io {
        path: path.display().to_string(),
        reason: format!("invalid date: {}", raw),
    })
}

fn records(content: &str, path: &Path) -> FetchResult<Vec<csv::StringRecord>> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    rdr.records()
        .map(|r| {
            r.map_err(|e| FetchError::Io {
                path: path.display().to_string(),
                reason: format!("CSV parse error: {}", e),
            })
        })
        .collect()
}

impl QuotePort for CsvAdapter {
    fn fetch_info(&self, ticker: &str, _proxy: Option<&ProxyRoute>) -> FetchResult<SecurityInfo> {
        let path = self.ticker_path(ticker, ".json");
        let content = match read_file(&path) {
            Ok(c) => c,
            Err((ErrorKind::NotFound, _)) => {
                return Err(FetchError::Provider {
                    ticker: ticker.to_string(),
                    reason: "Quote not found for ticker symbol".to_string(),
                });
            }
            Err((_, e)) => return Err(e),
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(fields)) => Ok(SecurityInfo::new(fields)),
            Ok(_) => Err(FetchError::Decode {
                ticker: ticker.to_string(),
                reason: "metadata is not a JSON object".to_string(),
            }),
            Err(e) => Err(FetchError::Decode {
                ticker: ticker.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn fetch_history(
        &self,
        ticker: &str,
        request: &HistoryRequest,
        _proxy: Option<&ProxyRoute>,
    ) -> FetchResult<PriceHistory> {
        let path = self.ticker_path(ticker, ".csv");
        let content = match read_file(&path) {
            Ok(c) => c,
            Err((ErrorKind::NotFound, _)) => {
                log::debug!("no history fixture for {}", ticker);
                return Ok(PriceHistory::new(ticker, Vec::new()));
            }
            Err((_, e)) => return Err(e),
        };

        let mut bars = Vec::new();
        for record in records(&content, &path)? {
            bars.push(Bar {
                timestamp: timestamp(&record, &path)?,
                open: number(&record, 1, "open", &path)?,
                high: number(&record, 2, "high", &path)?,
                low: number(&record, 3, "low", &path)?,
                close: number(&record, 4, "close", &path)?,
                volume: number(&record, 5, "volume", &path)?,
            });
        }
        let history = PriceHistory::new(ticker, bars);

        let start = match request.start {
            Some(date) => date
                .and_hms_opt(0, 0, 0)
                .map(|dt| Utc.from_utc_datetime(&dt).fixed_offset()),
            None => history
                .last()
                .and_then(|last| request.period.window_start(last.timestamp)),
        };

        Ok(match start {
            Some(start) => history.since(start),
            None => history,
        })
    }

    fn fetch_splits(&self, ticker: &str, _proxy: Option<&ProxyRoute>) -> FetchResult<Vec<Split>> {
        let path = self.ticker_path(ticker, ".splits.csv");
        let content = match read_file(&path) {
            Ok(c) => c,
            Err((ErrorKind::NotFound, _)) => return Ok(Vec::new()),
            Err((_, e)) => return Err(e),
        };

        let mut splits = records(&content, &path)?
            .iter()
            .map(|record| {
                Ok(Split {
                    timestamp: timestamp(record, &path)?,
                    numerator: number(record, 1, "numerator", &path)?,
                    denominator: number(record, 2, "denominator", &path)?,
                })
            })
            .collect::<FetchResult<Vec<_>>>()?;
        splits.sort_by_key(|s| s.timestamp);
        Ok(splits)
    }
}

impl TablePort for CsvAdapter {
    fn fetch_table(&self, url: &str, _proxy: Option<&ProxyRoute>) -> FetchResult<Table> {
        let path = self.table_path(url);
        let content = match read_file(&path) {
            Ok(c) => c,
            Err((ErrorKind::NotFound, _)) => {
                return Err(FetchError::NoTable {
                    url: url.to_string(),
                });
            }
            Err((_, e)) => return Err(e),
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let columns = rdr
            .headers()
            .map_err(|e| FetchError::Io {
                path: path.display().to_string(),
                reason: format!("CSV parse error: {}", e),
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let rows = records(&content, &path)?
            .iter()
            .map(|r| r.iter().map(|c| c.trim().to_string()).collect())
            .collect();
        Ok(Table::new(columns, rows))
    }
}
