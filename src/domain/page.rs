//! Page orchestration.
//!
//! [`render_page`] runs one pass of the dashboard: refresh, ticker parsing
//! and validation, history fetches, chart assembly and the market overview.
//! Fetch failures become inline notices and clear their memo entry; nothing
//! in a render is fatal.

use crate::domain::chart::Figure;
use crate::domain::chart::comparison::comparison;
use crate::domain::chart::gauge::gauge;
use crate::domain::chart::overlay::overlay;
use crate::domain::chart::panels::{PanelOptions, panel_stack};
use crate::domain::chart::table::table_figure;
use crate::domain::fetch::Fetcher;
use crate::domain::history::{CombinedHistory, PriceHistory};
use crate::domain::indicator::{
    Indicator, OverlayAverages, compute_indicators, with_overlay,
};
use crate::domain::info::info_table;
use crate::domain::overview::{OverviewOptions, market_overview};
use crate::domain::period::{HistoryRequest, Interval, Period};
use crate::domain::session::{PageInput, SessionState};
use crate::domain::table::Table;
use crate::domain::tickers::{MAX_TICKERS, parse_tickers, validate_tickers};
use chrono::{DateTime, FixedOffset, NaiveDateTime};

pub const PAGE_TITLE: &str = "Stock Market Dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Error,
    Warning,
    Info,
}

impl NoticeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeLevel::Error => "error",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    /// Element id, unique within the page.
    pub id: String,
    pub figure: Figure,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Notice(Notice),
    Chart(Chart),
}

impl Item {
    pub fn chart(id: impl Into<String>, figure: Figure) -> Self {
        Item::Chart(Chart {
            id: id.into(),
            figure,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub heading: String,
    pub items: Vec<Item>,
}

impl Section {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn charts(&self) -> impl Iterator<Item = &Chart> {
        self.items.iter().filter_map(|i| match i {
            Item::Chart(c) => Some(c),
            Item::Notice(_) => None,
        })
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter().filter_map(|i| match i {
            Item::Notice(n) => Some(n),
            Item::Chart(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub title: String,
    pub last_update: NaiveDateTime,
    pub dark_mode: bool,
    pub ticker_text: String,
    /// Tickers that passed validation, in input order.
    pub tickers: Vec<String>,
    pub period: Period,
    pub interval: Interval,
    pub volume: bool,
    pub indicators: Vec<Indicator>,
    pub overlay_span: Option<usize>,
    pub overlay_averages: OverlayAverages,
    /// Notices raised while reading the sidebar input.
    pub notices: Vec<Notice>,
    pub sections: Vec<Section>,
}

impl Page {
    pub fn all_notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices
            .iter()
            .chain(self.sections.iter().flat_map(Section::notices))
    }

    pub fn charts(&self) -> impl Iterator<Item = &Chart> {
        self.sections.iter().flat_map(Section::charts)
    }

    pub fn chart(&self, id: &str) -> Option<&Chart> {
        self.charts().find(|c| c.id == id)
    }
}

fn chart_id(prefix: &str, ticker: &str) -> String {
    let slug: String = ticker
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("{}-{}", prefix, slug)
}

/// Interval to use for `period`: the requested one when allowed, otherwise
/// the period's default, with a notice when a request was overridden.
fn resolve_interval(
    period: Period,
    requested: Option<Interval>,
    notices: &mut Vec<Notice>,
) -> Interval {
    let fallback = Interval::default_for(period);
    match requested {
        Some(interval) if interval.is_allowed_for(period) => interval,
        Some(interval) => {
            notices.push(Notice::warning(format!(
                "Interval {} is not available for period {}; using {}",
                interval, period, fallback
            )));
            fallback
        }
        None => fallback,
    }
}

fn splits_table(fetcher: &Fetcher, ticker: &str) -> Section {
    let mut section = Section::new("Splits");
    let splits = fetcher.fetch_splits(ticker);

    match splits.as_ref() {
        Err(e) => {
            log::warn!("splits for {} unavailable: {}", ticker, e);
            section.push(Item::Notice(Notice::error(e.to_string())));
            fetcher.clear_splits(ticker);
        }
        Ok(splits) if splits.is_empty() => {
            section.push(Item::Notice(Notice::info(format!("No splits recorded for {}", ticker))));
        }
        Ok(splits) => {
            let rows = splits
                .iter()
                .map(|s| {
                    vec![
                        s.timestamp.format("%Y-%m-%d").to_string(),
                        format!("{}:{}", s.numerator, s.denominator),
                    ]
                })
                .collect();
            let table = Table::new(vec!["Date".into(), "Split".into()], rows);
            section.push(Item::chart(chart_id("splits", ticker), table_figure(&table)));
        }
    }

    section
}

fn single_security(
    fetcher: &Fetcher,
    ticker: &str,
    history: &PriceHistory,
    input: &PageInput,
) -> Vec<Section> {
    let info = fetcher.fetch_info(ticker);
    let info = info.as_ref().as_ref().ok();
    let name = info
        .and_then(|i| i.short_name())
        .unwrap_or(ticker)
        .to_string();
    let currency = info.and_then(|i| i.currency()).unwrap_or("").to_string();

    let mut section = Section::new(format!("Security: {}", name));
    if let Some(info) = info {
        let display = info_table(info);
        if !display.is_empty() {
            section.push(Item::chart(chart_id("info", ticker), table_figure(&display.to_table())));
        }
    }

    let with_indicators = compute_indicators(history, &input.indicators);
    let options = PanelOptions {
        title: name.clone(),
        currency,
        volume: input.volume,
    };
    section.push(Item::chart(chart_id("panels", ticker), panel_stack(&with_indicators, &options)));

    if let Some(span) = input.overlay_span.filter(|_| input.overlay_averages.any()) {
        let overlaid = with_overlay(history, span, input.overlay_averages);
        section.push(Item::chart(
            chart_id("overlay", ticker),
            overlay(&overlaid, &format!("{} - {} period moving averages", name, span), span),
        ));
    }

    vec![section, splits_table(fetcher, ticker)]
}

/// One render pass of the dashboard.
pub fn render_page(
    fetcher: &Fetcher,
    session: &mut SessionState,
    input: &PageInput,
    overview: &OverviewOptions,
    now: DateTime<FixedOffset>,
) -> Page {
    if input.refresh {
        fetcher.clear_all();
        session.touch(now);
    }
    if let Some(text) = &input.tickers {
        session.tickers = text.clone();
    }
    if let Some(dark) = input.dark_mode {
        session.toggle_theme = dark;
        session.dark_mode = dark;
    }

    let mut notices = Vec::new();

    let parsed = parse_tickers(&session.tickers);
    if parsed.truncated() {
        notices.push(Notice::error(format!("Only first {} tickers are shown", MAX_TICKERS)));
    }

    let validation = validate_tickers(fetcher, &parsed.tickers);
    for rejected in &validation.rejected {
        notices.push(Notice::error(rejected.to_string()));
    }
    let tickers = validation.valid;

    let interval = resolve_interval(input.period, input.interval, &mut notices);
    let request = HistoryRequest::new(input.period, interval);

    let mut performance = Section::new("Performance");
    let mut histories = Vec::new();
    for ticker in &tickers {
        let history = fetcher.fetch_history(ticker, &request);
        match history.as_ref() {
            Err(e) => {
                log::warn!("history for {} unavailable: {}", ticker, e);
                performance.push(Item::Notice(Notice::error(e.to_string())));
                fetcher.clear_history(ticker, &request);
            }
            Ok(h) if h.is_empty() => {
                performance.push(Item::Notice(Notice::warning(format!(
                    "No historical data for {} ({}, {})",
                    ticker, input.period, interval
                ))));
            }
            Ok(h) => histories.push(h.clone()),
        }
    }

    let combined = CombinedHistory::from_histories(&histories);
    for history in &histories {
        if let Some(fig) = gauge(&combined, history.ticker()) {
            performance.push(Item::chart(chart_id("gauge", history.ticker()), fig));
        }
    }

    let mut sections = vec![performance];

    if tickers.len() == 1 {
        if let Some(history) = histories.first() {
            sections.extend(single_security(fetcher, &tickers[0], history, input));
        }
    } else if tickers.len() > 1 {
        if !input.indicators.is_empty() {
            notices.push(Notice::info(
                "Technical indicators are only available when a single security is selected",
            ));
        }
        if !histories.is_empty() {
            let mut section = Section::new("Comparison");
            section.push(Item::chart(
                "comparison",
                comparison(&combined, &format!("Percentage change ({})", input.period)),
            ));
            sections.push(section);
        }
    }

    sections.extend(market_overview(fetcher, overview));

    Page {
        title: PAGE_TITLE.to_string(),
        last_update: session.last_update,
        dark_mode: session.dark_mode,
        ticker_text: session.tickers.clone(),
        tickers,
        period: input.period,
        interval,
        volume: input.volume,
        indicators: input.indicators.clone(),
        overlay_span: input.overlay_span,
        overlay_averages: input.overlay_averages,
        notices,
        sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_ids_are_slugs() {
        assert_eq!(chart_id("gauge", "TATAMOTORS.NS"), "gauge-tatamotors-ns");
        assert_eq!(chart_id("info", "^GSPC"), "info--gspc");
    }

    #[test]
    fn interval_falls_back_to_period_default() {
        let mut notices = Vec::new();
        assert_eq!(
            resolve_interval(Period::ThreeMonths, None, &mut notices),
            Interval::OneDay
        );
        assert!(notices.is_empty());

        assert_eq!(
            resolve_interval(Period::OneMonth, Some(Interval::OneMonth), &mut notices),
            Interval::default_for(Period::OneMonth)
        );
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);

        assert_eq!(
            resolve_interval(Period::OneYear, Some(Interval::OneWeek), &mut notices),
            Interval::OneWeek
        );
    }

    #[test]
    fn section_splits_items() {
        let mut section = Section::new("S");
        section.push(Item::Notice(Notice::error("boom")));
        section.push(Item::chart("c", Figure {
            data: vec![],
            layout: Default::default(),
        }));

        assert_eq!(section.notices().count(), 1);
        assert_eq!(section.charts().next().unwrap().id, "c");
    }
}
