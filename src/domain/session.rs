//! Per-session UI state and the inputs of one page render.

use crate::domain::indicator::{Indicator, OverlayAverages};
use crate::domain::period::{Interval, Period};
use chrono::{DateTime, FixedOffset, NaiveDateTime, SubsecRound};

pub const DEFAULT_TICKERS: &str = "TATAMOTORS.NS";
pub const DEFAULT_FINANCIAL_PERIOD: &str = "Annual";

/// State kept between renders of one session. Created once, on the first
/// render, and only updated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Wall-clock time of the last refresh, second precision, no offset.
    pub last_update: NaiveDateTime,
    pub tickers: String,
    pub dark_mode: bool,
    pub toggle_theme: bool,
    pub financial_period: String,
}

impl SessionState {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            last_update: now.naive_local().trunc_subsecs(0),
            tickers: DEFAULT_TICKERS.to_string(),
            dark_mode: false,
            toggle_theme: false,
            financial_period: DEFAULT_FINANCIAL_PERIOD.to_string(),
        }
    }

    /// Returns the session in `slot`, creating it with defaults on first use.
    pub fn get_or_init(
        slot: &mut Option<SessionState>,
        now: DateTime<FixedOffset>,
    ) -> &mut SessionState {
        slot.get_or_insert_with(|| SessionState::new(now))
    }

    pub fn touch(&mut self, now: DateTime<FixedOffset>) {
        self.last_update = now.naive_local().trunc_subsecs(0);
    }
}

/// User input for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct PageInput {
    /// Replaces the session's ticker text when present.
    pub tickers: Option<String>,
    pub period: Period,
    /// Falls back to the period's default interval when absent or not allowed.
    pub interval: Option<Interval>,
    pub volume: bool,
    pub indicators: Vec<Indicator>,
    /// Time span of the overlay chart; no overlay chart when absent.
    pub overlay_span: Option<usize>,
    pub overlay_averages: OverlayAverages,
    pub refresh: bool,
    pub dark_mode: Option<bool>,
}

impl Default for PageInput {
    fn default() -> Self {
        Self {
            tickers: None,
            period: Period::default(),
            interval: None,
            volume: true,
            indicators: Vec::new(),
            overlay_span: None,
            overlay_averages: OverlayAverages::default(),
            refresh: false,
            dark_mode: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ts: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(ts).unwrap()
    }

    #[test]
    fn defaults() {
        let state = SessionState::new(at("2024-06-15T10:30:45.987+05:30"));

        assert_eq!(state.tickers, "TATAMOTORS.NS");
        assert!(!state.dark_mode);
        assert!(!state.toggle_theme);
        assert_eq!(state.financial_period, "Annual");
        assert_eq!(state.last_update.to_string(), "2024-06-15 10:30:45");
    }

    #[test]
    fn initialized_once() {
        let mut slot = None;
        SessionState::get_or_init(&mut slot, at("2024-06-15T10:00:00+00:00")).tickers = "MSFT".into();

        let state = SessionState::get_or_init(&mut slot, at("2024-06-16T10:00:00+00:00"));
        assert_eq!(state.tickers, "MSFT");
        assert_eq!(state.last_update.to_string(), "2024-06-15 10:00:00");
    }

    #[test]
    fn touch_updates_last_update() {
        let mut state = SessionState::new(at("2024-06-15T10:00:00+00:00"));
        state.touch(at("2024-06-15T11:22:33.5+00:00"));
        assert_eq!(state.last_update.to_string(), "2024-06-15 11:22:33");
    }

    #[test]
    fn page_input_defaults() {
        let input = PageInput::default();
        assert_eq!(input.period, Period::ThreeMonths);
        assert!(input.volume);
        assert!(!input.refresh);
    }
}
