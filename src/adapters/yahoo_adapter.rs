//! Yahoo Finance quote provider.
//!
//! Metadata comes from `quoteSummary`, which needs a session cookie and a
//! crumb token. History and split events come from the `v8/finance/chart`
//! endpoint. A fresh blocking client is built for every call.

use crate::adapters::proxy_list_adapter::reqwest_proxy;
use crate::domain::error::{DashboardError, FetchError, FetchResult};
use crate::domain::history::PriceHistory;
use crate::domain::info::SecurityInfo;
use crate::domain::ohlcv::{Bar, Split};
use crate::domain::period::{HistoryRequest, Interval};
use crate::domain::proxy::ProxyRoute;
use crate::ports::config_port::ConfigPort;
use crate::ports::quote_port::QuotePort;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_PATH: &str = "/v1/test/getcrumb";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
const SUMMARY_MODULES: &str = "quoteType,price,summaryProfile,assetProfile,summaryDetail,\
defaultKeyStatistics,financialData,fundProfile";

pub struct YahooAdapter {
    base_url: String,
    timeout: Option<Duration>,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooAdapter {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, DashboardError> {
        let mut adapter = Self::new();
        if let Some(url) = config.get_string("provider", "base_url") {
            adapter = adapter.with_base_url(url.trim());
        }
        if config.get_string("provider", "timeout_secs").is_some() {
            let secs = config.get_int("provider", "timeout_secs", 0);
            if secs <= 0 {
                return Err(DashboardError::invalid(
                    "provider",
                    "timeout_secs",
                    "timeout_secs must be a positive number of seconds",
                ));
            }
            adapter = adapter.with_timeout(Duration::from_secs(secs as u64));
        }
        Ok(adapter)
    }

    fn client(&self, proxy: Option<&ProxyRoute>) -> FetchResult<reqwest::blocking::Client> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(route) = proxy {
            builder = builder.proxy(reqwest_proxy(route)?);
        }
        builder.build().map_err(|e| FetchError::Http {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })
    }

    fn get_text(
        &self,
        client: &reqwest::blocking::Client,
        url: &str,
    ) -> FetchResult<(u16, String)> {
        log::debug!("GET {}", url);
        let resp = client.get(url).send().map_err(|e| FetchError::Http {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| FetchError::Http {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok((status, body))
    }

    fn crumb(&self, client: &reqwest::blocking::Client, ticker: &str) -> FetchResult<String> {
        // Only the cookie matters; fc.yahoo.com answers 404.
        if let Err(e) = client.get(COOKIE_URL).send() {
            log::debug!("cookie request for {} failed: {}", ticker, e);
        }

        let url = format!("{}{}", self.base_url, CRUMB_PATH);
        let (status, crumb) = self.get_text(client, &url)?;
        let crumb = crumb.trim().to_string();
        if status != 200 || crumb.is_empty() || crumb.contains('<') {
            return Err(FetchError::Provider {
                ticker: ticker.to_string(),
                reason: format!("could not obtain crumb (HTTP {})", status),
            });
        }
        Ok(crumb)
    }

    fn chart(
        &self,
        ticker: &str,
        query: &str,
        proxy: Option<&ProxyRoute>,
    ) -> FetchResult<(PriceHistory, Vec<Split>)> {
        let client = self.client(proxy)?;
        let url = format!(
            "{}/v8/finance/chart/{}?{}&includePrePost=false&events=div%2Csplits",
            self.base_url,
            urlencoding::encode(ticker),
            query
        );
        let (status, body) = self.get_text(&client, &url)?;
        parse_chart(ticker, &body).map_err(|e| match e {
            FetchError::Decode { .. } if status != 200 => FetchError::Http {
                url,
                reason: format!("HTTP status {}", status),
            },
            other => other,
        })
    }
}

/// Query string selecting the history window: `range` for a period, or
/// `period1`/`period2` epoch seconds from `start` until `now`.
pub fn history_query(request: &HistoryRequest, now: DateTime<Utc>) -> String {
    let window = match request.start.and_then(|d| d.and_hms_opt(0, 0, 0)) {
        Some(start) => format!(
            "period1={}&period2={}",
            start.and_utc().timestamp(),
            now.timestamp()
        ),
        None => format!("range={}", request.period),
    };
    format!("{}&interval={}", window, request.interval)
}

/// Flattens `quoteSummary` modules into one field → scalar mapping.
///
/// `{raw, fmt}` objects reduce to `raw`; nested objects without `raw`,
/// arrays and nulls are dropped. Later modules overwrite earlier ones.
pub fn flatten_summary(result: &Value) -> Map<String, Value> {
    let mut fields = Map::new();
    let Some(modules) = result.as_object() else {
        return fields;
    };

    for module in modules.values() {
        let Some(entries) = module.as_object() else {
            continue;
        };
        for (key, value) in entries {
            let scalar = match value {
                Value::Object(obj) => match obj.get("raw") {
                    Some(raw) if !raw.is_null() => raw.clone(),
                    _ => continue,
                },
                Value::Array(_) | Value::Null => continue,
                other => other.clone(),
            };
            fields.insert(key.clone(), scalar);
        }
    }
    fields
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<Value>>,
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    code: Option<String>,
    description: Option<String>,
}

impl ProviderError {
    fn reason(&self) -> String {
        self.description
            .clone()
            .or_else(|| self.code.clone())
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

/// Decodes a `quoteSummary` response body.
pub fn parse_summary(ticker: &str, body: &str) -> FetchResult<SecurityInfo> {
    let envelope: SummaryEnvelope = serde_json::from_str(body).map_err(|e| FetchError::Decode {
        ticker: ticker.to_string(),
        reason: e.to_string(),
    })?;
    if let Some(err) = envelope.quote_summary.error {
        return Err(FetchError::Provider {
            ticker: ticker.to_string(),
            reason: err.reason(),
        });
    }
    let result = envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::Provider {
            ticker: ticker.to_string(),
            reason: "empty quoteSummary result".to_string(),
        })?;
    Ok(SecurityInfo::new(flatten_summary(&result)))
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
    #[serde(default)]
    events: Option<ChartEvents>,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct ChartEvents {
    #[serde(default)]
    splits: BTreeMap<String, SplitEvent>,
}

#[derive(Debug, Deserialize)]
struct SplitEvent {
    date: i64,
    numerator: f64,
    denominator: f64,
}

fn to_exchange_time(epoch: i64, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp(epoch, 0).map(|utc| utc.with_timezone(offset))
}

/// Decodes a `v8/finance/chart` body into bars and split events.
///
/// Rows with a missing open, high, low or close are skipped; a missing
/// volume is zero. Timestamps carry the exchange's UTC offset.
pub fn parse_chart(ticker: &str, body: &str) -> FetchResult<(PriceHistory, Vec<Split>)> {
    let envelope: ChartEnvelope = serde_json::from_str(body).map_err(|e| FetchError::Decode {
        ticker: ticker.to_string(),
        reason: e.to_string(),
    })?;
    if let Some(err) = envelope.chart.error {
        return Err(FetchError::Provider {
            ticker: ticker.to_string(),
            reason: err.reason(),
        });
    }
    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok((PriceHistory::new(ticker, Vec::new()), Vec::new()));
    };

    let offset = FixedOffset::east_opt(result.meta.gmtoffset).ok_or_else(|| FetchError::Decode {
        ticker: ticker.to_string(),
        reason: format!("invalid gmtoffset {}", result.meta.gmtoffset),
    })?;
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let at = |v: &Vec<Option<f64>>, i: usize| v.get(i).copied().flatten();

    let bars = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &epoch)| {
            Some(Bar {
                timestamp: to_exchange_time(epoch, &offset)?,
                open: at(&quote.open, i)?,
                high: at(&quote.high, i)?,
                low: at(&quote.low, i)?,
                close: at(&quote.close, i)?,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            })
        })
        .collect();

    let mut splits: Vec<Split> = result
        .events
        .map(|e| e.splits.into_values().collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|s| {
            Some(Split {
                timestamp: to_exchange_time(s.date, &offset)?,
                numerator: s.numerator,
                denominator: s.denominator,
            })
        })
        .collect();
    splits.sort_by_key(|s| s.timestamp);

    Ok((PriceHistory::new(ticker, bars), splits))
}

impl QuotePort for YahooAdapter {
    fn fetch_info(&self, ticker: &str, proxy: Option<&ProxyRoute>) -> FetchResult<SecurityInfo> {
        log::info!("fetching info for {}", ticker);
        let client = self.client(proxy)?;
        let crumb = self.crumb(&client, ticker)?;
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules={}&crumb={}",
            self.base_url,
            urlencoding::encode(ticker),
            urlencoding::encode(SUMMARY_MODULES),
            urlencoding::encode(&crumb)
        );
        let (status, body) = self.get_text(&client, &url)?;
        parse_summary(ticker, &body).map_err(|e| match e {
            FetchError::Decode { .. } if status != 200 => FetchError::Http {
                url,
                reason: format!("HTTP status {}", status),
            },
            other => other,
        })
    }

    fn fetch_history(
        &self,
        ticker: &str,
        request: &HistoryRequest,
        proxy: Option<&ProxyRoute>,
    ) -> FetchResult<PriceHistory> {
        log::info!(
            "fetching history for {} ({}, {})",
            ticker,
            request.period,
            request.interval
        );
        let query = history_query(request, Utc::now());
        self.chart(ticker, &query, proxy).map(|(history, _)| history)
    }

    fn fetch_splits(&self, ticker: &str, proxy: Option<&ProxyRoute>) -> FetchResult<Vec<Split>> {
        log::info!("fetching splits for {}", ticker);
        let query = format!("range=max&interval={}", Interval::OneMonth);
        self.chart(ticker, &query, proxy).map(|(_, splits)| splits)
    }
}
