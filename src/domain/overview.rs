//! Market overview: global indices and exchange top movers.

use crate::domain::chart::table::table_figure;
use crate::domain::fetch::Fetcher;
use crate::domain::page::{Item, Notice, Section};
use crate::domain::period::{HistoryRequest, Interval, Period};
use crate::domain::table::Table;
use std::fmt;
use std::str::FromStr;

/// Symbol and display name of each index in the overview.
pub const INDICES: [(&str, &str); 6] = [
    ("^GSPC", "S&P 500"),
    ("^DJI", "Dow Jones"),
    ("^IXIC", "NASDAQ"),
    ("^N225", "Nikkei 225"),
    ("^GDAXI", "DAX"),
    ("^NSEI", "NIFTY 50"),
];

pub const INDEX_COLUMNS: [&str; 4] = ["Index", "Price", "Change", "Change (%)"];
pub const MOVER_COLUMNS: [&str; 4] = ["Symbol", "Last Traded Price", "Change", "Change %"];
pub const TOP_MOVERS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exchange {
    Nse,
    Bse,
}

impl Exchange {
    pub const ALL: [Exchange; 2] = [Exchange::Nse, Exchange::Bse];

    pub fn gainers_url(&self) -> &'static str {
        match self {
            Exchange::Nse => {
                "https://www.nseindia.com/live_market/dynaContent/live_analysis/nifty_top_gainers.htm"
            }
            Exchange::Bse => "https://www.bseindia.com/markets/equity/EQReports/topGainers.aspx",
        }
    }

    pub fn losers_url(&self) -> &'static str {
        match self {
            Exchange::Nse => {
                "https://www.nseindia.com/live_market/dynaContent/live_analysis/nifty_top_losers.htm"
            }
            Exchange::Bse => "https://www.bseindia.com/markets/equity/EQReports/topLosers.aspx",
        }
    }

    /// Scraped column names mapped onto [`MOVER_COLUMNS`].
    pub fn source_columns(&self) -> [&'static str; 4] {
        match self {
            Exchange::Nse => ["Symbol", "Last", "Change", "% Change"],
            Exchange::Bse => ["Company", "Close", "Change", "%Change"],
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exchange::Nse => write!(f, "NSE"),
            Exchange::Bse => write!(f, "BSE"),
        }
    }
}

impl FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NSE" => Ok(Exchange::Nse),
            "BSE" => Ok(Exchange::Bse),
            other => Err(format!("invalid exchange: {other} (choose NSE or BSE)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverviewOptions {
    pub show_indices: bool,
    pub exchanges: Vec<Exchange>,
}

impl Default for OverviewOptions {
    fn default() -> Self {
        Self {
            show_indices: true,
            exchanges: Exchange::ALL.to_vec(),
        }
    }
}

impl OverviewOptions {
    pub fn disabled() -> Self {
        Self {
            show_indices: false,
            exchanges: Vec::new(),
        }
    }
}

/// `"<value> <change>"` as a two-line HTML cell, the change colored green
/// when it starts with `+` and red otherwise.
pub fn format_quote(value: &str) -> String {
    match value.split_once(' ') {
        Some((base, change)) => {
            let color = if change.starts_with('+') { "green" } else { "red" };
            format!("{base}<br><span style='color: {color};'>{change}</span>")
        }
        None => value.to_string(),
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().trim_end_matches('%').replace(',', "").parse().ok()
}

/// Projects a scraped movers table onto [`MOVER_COLUMNS`], keeps the top
/// rows and formats the numeric columns to two decimals. `None` when the
/// page does not carry the expected columns.
pub fn movers_table(raw: &Table, exchange: Exchange) -> Option<Table> {
    let projected = raw
        .select(&exchange.source_columns())?
        .renamed(&MOVER_COLUMNS)
        .head(TOP_MOVERS);

    let rows = projected
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(i, cell)| match (i, parse_number(cell)) {
                    (1 | 2, Some(v)) => format!("{:.2}", v),
                    (3, Some(v)) => format!("{:.2}%", v),
                    _ => cell.clone(),
                })
                .collect()
        })
        .collect();

    Some(Table::new(projected.columns().to_vec(), rows))
}

/// Latest close, change and percent change of each index from its last
/// two daily closes.
pub fn index_quotes(fetcher: &Fetcher) -> (Table, Vec<Notice>) {
    let request = HistoryRequest::new(Period::FiveDays, Interval::OneDay);
    let mut rows = Vec::new();
    let mut notices = Vec::new();

    for (symbol, name) in INDICES {
        let history = fetcher.fetch_history(symbol, &request);
        match history.as_ref() {
            Err(e) => {
                log::warn!("index {} unavailable: {}", symbol, e);
                notices.push(Notice::error(format!("Error fetching indices: {}", e)));
                fetcher.clear_history(symbol, &request);
            }
            Ok(history) => {
                let bars = history.bars();
                if bars.len() < 2 {
                    notices.push(Notice::warning(format!("No index data retrieved for {}.", name)));
                    continue;
                }
                let last = bars[bars.len() - 1].close;
                let previous = bars[bars.len() - 2].close;
                let change = last - previous;
                let pct = if previous != 0.0 { change / previous * 100.0 } else { 0.0 };
                rows.push(vec![
                    name.to_string(),
                    format_quote(&format!("{:.2} {:+.2}%", last, pct)),
                    format!("{:+.2}", change),
                    format!("{:+.2}%", pct),
                ]);
            }
        }
    }

    let columns = INDEX_COLUMNS.iter().map(|c| c.to_string()).collect();
    (Table::new(columns, rows), notices)
}

fn movers_section(fetcher: &Fetcher, exchange: Exchange, label: &str, url: &str) -> Section {
    let mut section = Section::new(format!("Top {} {} ({})", TOP_MOVERS, label, exchange));
    let table = fetcher.fetch_table(url);

    match table.as_ref() {
        Err(e) => {
            log::warn!("top movers for {} unavailable: {}", exchange, e);
            section.push(Item::Notice(Notice::error(format!(
                "Error fetching top movers for {}: {}",
                exchange, e
            ))));
            fetcher.clear_table(url);
        }
        Ok(raw) if raw.is_empty() => {
            section.push(Item::Notice(Notice::warning(format!(
                "No {} data for {}.",
                label.to_lowercase(),
                exchange
            ))));
        }
        Ok(raw) => match movers_table(raw, exchange) {
            Some(movers) => section.push(Item::chart(
                format!("{}-{}", exchange, label).to_lowercase(),
                table_figure(&movers),
            )),
            None => section.push(Item::Notice(Notice::warning(format!(
                "Unexpected table layout at {}",
                url
            )))),
        },
    }

    section
}

/// Sections for the indices table and each exchange's gainers and losers.
pub fn market_overview(fetcher: &Fetcher, options: &OverviewOptions) -> Vec<Section> {
    let mut sections = Vec::new();

    if options.show_indices {
        let mut section = Section::new("Major Global Indices");
        let (table, notices) = index_quotes(fetcher);
        section.items.extend(notices.into_iter().map(Item::Notice));
        if table.is_empty() {
            section.push(Item::Notice(Notice::warning("No index data retrieved.")));
        } else {
            section.push(Item::chart("indices", table_figure(&table)));
        }
        sections.push(section);
    }

    for exchange in &options.exchanges {
        sections.push(movers_section(fetcher, *exchange, "Gainers", exchange.gainers_url()));
        sections.push(movers_section(fetcher, *exchange, "Losers", exchange.losers_url()));
    }

    sections
}
