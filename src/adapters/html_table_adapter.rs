//! Scrapes the first HTML `<table>` of a page.

use crate::adapters::proxy_list_adapter::reqwest_proxy;
use crate::domain::error::{DashboardError, FetchError, FetchResult};
use crate::domain::proxy::ProxyRoute;
use crate::domain::table::Table;
use crate::ports::config_port::ConfigPort;
use crate::ports::table_port::TablePort;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HtmlTableAdapter {
    user_agent: String,
    timeout: Duration,
}

impl Default for HtmlTableAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlTableAdapter {
    pub fn new() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, DashboardError> {
        let mut adapter = Self::new();
        if let Some(agent) = config
            .get_string("tables", "user_agent")
            .filter(|s| !s.trim().is_empty())
        {
            adapter.user_agent = agent.trim().to_string();
        }
        if config.get_string("tables", "timeout_secs").is_some() {
            let secs = config.get_int("tables", "timeout_secs", 0);
            if secs <= 0 {
                return Err(DashboardError::invalid(
                    "tables",
                    "timeout_secs",
                    "timeout_secs must be a positive number of seconds",
                ));
            }
            adapter.timeout = Duration::from_secs(secs as u64);
        }
        Ok(adapter)
    }
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses the first `<table>` in `html`.
///
/// The first non-empty row is the header, whether it holds `<th>` or `<td>`
/// cells. Remaining rows become string cells, whitespace collapsed.
pub fn parse_first_table(html: &str) -> Option<Table> {
    let document = Html::parse_document(html);
    let table_sel = Selector::parse("table").ok()?;
    let row_sel = Selector::parse("tr").ok()?;
    let cell_sel = Selector::parse("th, td").ok()?;

    let table = document.select(&table_sel).next()?;
    let mut rows = table
        .select(&row_sel)
        .filter(|row| {
            // Rows of nested tables belong to those tables.
            row.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "table")
                .is_some_and(|owner| owner.id() == table.id())
        })
        .map(|row| row.select(&cell_sel).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty());

    let header = rows.next()?;
    let body = rows.collect();
    Some(Table::new(header, body))
}

impl TablePort for HtmlTableAdapter {
    fn fetch_table(&self, url: &str, proxy: Option<&ProxyRoute>) -> FetchResult<Table> {
        log::info!("fetching table from {}", url);

        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.timeout);
        if let Some(route) = proxy {
            builder = builder.proxy(reqwest_proxy(route)?);
        }
        let http_error = |reason: String| FetchError::Http {
            url: url.to_string(),
            reason,
        };
        let client = builder.build().map_err(|e| http_error(e.to_string()))?;

        let resp = client.get(url).send().map_err(|e| http_error(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(http_error(format!("HTTP status {}", resp.status())));
        }
        let body = resp.text().map_err(|e| http_error(e.to_string()))?;

        parse_first_table(&body).ok_or_else(|| FetchError::NoTable { url: url.to_string() })
    }
}
