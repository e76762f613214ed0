//! Technical indicators appended to a price history as named columns.
//!
//! - `Indicator`: identity of a selectable indicator (`SMA_20`, `MACD`, ...)
//! - `compute_indicators`: appends the selected columns plus `ΔVolume%` and
//!   crossover markers for consecutive SMA pairs
//! - `with_overlay`: plain `SMA` and/or `EMA` columns over a user time span

pub mod atr;
pub mod crossover;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod volume;

use crate::domain::history::PriceHistory;
use std::fmt;
use std::str::FromStr;

/// One value per bar; `None` during warmup or where undefined.
pub type Series = Vec<Option<f64>>;

pub const VOLUME_CHANGE_COLUMN: &str = "ΔVolume%";
pub const MACD_COLUMN: &str = "MACD";
pub const SIGNAL_COLUMN: &str = "Signal";
pub const MACD_HIST_COLUMN: &str = "MACD_Hist";
pub const RSI_COLUMN: &str = "RSI";
pub const ATR_COLUMN: &str = "ATR";
pub const OVERLAY_SMA_COLUMN: &str = "SMA";
pub const OVERLAY_EMA_COLUMN: &str = "EMA";

pub const MIN_OVERLAY_SPAN: usize = 10;
pub const MAX_OVERLAY_SPAN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Indicator {
    Sma(usize),
    Ema(usize),
    Macd,
    Rsi,
    Atr,
}

impl Indicator {
    /// Choices offered when exactly one security is shown.
    pub const SELECTABLE: [Indicator; 8] = [
        Indicator::Sma(20),
        Indicator::Sma(50),
        Indicator::Sma(200),
        Indicator::Ema(20),
        Indicator::Ema(50),
        Indicator::Ema(200),
        Indicator::Macd,
        Indicator::Rsi,
    ];

    pub fn is_selectable(&self) -> bool {
        Indicator::SELECTABLE.contains(self)
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::Sma(period) => write!(f, "SMA_{}", period),
            Indicator::Ema(period) => write!(f, "EMA_{}", period),
            Indicator::Macd => write!(f, "{}", MACD_COLUMN),
            Indicator::Rsi => write!(f, "{}", RSI_COLUMN),
            Indicator::Atr => write!(f, "{}", ATR_COLUMN),
        }
    }
}

impl FromStr for Indicator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let period = |digits: &str| {
            digits
                .parse::<usize>()
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| format!("invalid indicator period: {s}"))
        };

        match s {
            "MACD" => Ok(Indicator::Macd),
            "RSI" => Ok(Indicator::Rsi),
            "ATR" => Ok(Indicator::Atr),
            _ => {
                if let Some(digits) = s.strip_prefix("SMA_") {
                    Ok(Indicator::Sma(period(digits)?))
                } else if let Some(digits) = s.strip_prefix("EMA_") {
                    Ok(Indicator::Ema(period(digits)?))
                } else {
                    Err(format!("unknown indicator: {s}"))
                }
            }
        }
    }
}

/// Column name for the crossover of two SMA periods, e.g. `Crossover_20/50`.
pub fn crossover_column(short: usize, long: usize) -> String {
    format!("Crossover_{}/{}", short, long)
}

/// Short period encoded in a crossover column name.
pub fn crossover_short_period(column: &str) -> Option<usize> {
    column
        .strip_prefix("Crossover_")?
        .split('/')
        .next()?
        .parse()
        .ok()
}

/// Returns a copy of `history` with the selected indicator columns appended.
///
/// `ΔVolume%` is always appended. Crossover columns are added for each
/// consecutive pair of distinct selected SMA periods in ascending order.
pub fn compute_indicators(history: &PriceHistory, selection: &[Indicator]) -> PriceHistory {
    let closes = history.closes();
    let mut out = history.clone();

    for indicator in selection {
        match indicator {
            Indicator::Sma(period) => {
                out = out.with_column(indicator.to_string(), sma::calculate_sma(&closes, *period));
            }
            Indicator::Ema(period) => {
                out = out.with_column(indicator.to_string(), ema::calculate_ema(&closes, *period));
            }
            Indicator::Macd => {
                let series = macd::calculate_macd_default(&closes);
                out = out
                    .with_column(MACD_COLUMN, series.line)
                    .with_column(SIGNAL_COLUMN, series.signal)
                    .with_column(MACD_HIST_COLUMN, series.histogram);
            }
            Indicator::Rsi => {
                out = out.with_column(RSI_COLUMN, rsi::calculate_rsi(&closes, rsi::DEFAULT_PERIOD));
            }
            Indicator::Atr => {
                out = out.with_column(
                    ATR_COLUMN,
                    atr::calculate_atr(history.bars(), atr::DEFAULT_PERIOD),
                );
            }
        }
    }

    out = out.with_column(
        VOLUME_CHANGE_COLUMN,
        volume::calculate_volume_change(history.bars()),
    );

    let mut sma_periods: Vec<usize> = selection
        .iter()
        .filter_map(|i| match i {
            Indicator::Sma(p) => Some(*p),
            _ => None,
        })
        .collect();
    sma_periods.sort_unstable();
    sma_periods.dedup();

    for pair in sma_periods.windows(2) {
        let (short, long) = (pair[0], pair[1]);
        let markers = crossover::calculate_crossover(
            &sma::calculate_sma(&closes, short),
            &sma::calculate_sma(&closes, long),
        );
        out = out.with_column(crossover_column(short, long), markers);
    }

    out
}

/// Which moving averages the overlay chart draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayAverages {
    pub sma: bool,
    pub ema: bool,
}

impl OverlayAverages {
    pub fn any(&self) -> bool {
        self.sma || self.ema
    }
}

impl Default for OverlayAverages {
    fn default() -> Self {
        Self {
            sma: true,
            ema: true,
        }
    }
}

/// Returns a copy of `history` with the selected `SMA` / `EMA` columns over
/// `span` bars.
pub fn with_overlay(
    history: &PriceHistory,
    span: usize,
    averages: OverlayAverages,
) -> PriceHistory {
    let closes = history.closes();
    let mut out = history.clone();
    if averages.sma {
        out = out.with_column(OVERLAY_SMA_COLUMN, sma::calculate_sma(&closes, span));
    }
    if averages.ema {
        out = out.with_column(OVERLAY_EMA_COLUMN, ema::calculate_ema(&closes, span));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::Bar;
    use chrono::{DateTime, Duration};

    fn make_history(closes: &[f64]) -> PriceHistory {
        let start = DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000 + i as u64,
            })
            .collect();
        PriceHistory::new("TEST", bars)
    }

    #[test]
    fn indicator_display_names() {
        assert_eq!(Indicator::Sma(20).to_string(), "SMA_20");
        assert_eq!(Indicator::Ema(200).to_string(), "EMA_200");
        assert_eq!(Indicator::Macd.to_string(), "MACD");
        assert_eq!(Indicator::Rsi.to_string(), "RSI");
        assert_eq!(Indicator::Atr.to_string(), "ATR");
    }

    #[test]
    fn indicator_parse() {
        assert_eq!("SMA_50".parse::<Indicator>(), Ok(Indicator::Sma(50)));
        assert_eq!(" EMA_20 ".parse::<Indicator>(), Ok(Indicator::Ema(20)));
        assert_eq!("MACD".parse::<Indicator>(), Ok(Indicator::Macd));
        assert!("SMA_0".parse::<Indicator>().is_err());
        assert!("SMA_X".parse::<Indicator>().is_err());
        assert!("WMA_10".parse::<Indicator>().is_err());
    }

    #[test]
    fn selectable_set_excludes_atr() {
        assert_eq!(Indicator::SELECTABLE.len(), 8);
        assert!(Indicator::Sma(200).is_selectable());
        assert!(!Indicator::Atr.is_selectable());
        assert!(!Indicator::Sma(30).is_selectable());
    }

    #[test]
    fn crossover_column_names() {
        assert_eq!(crossover_column(20, 50), "Crossover_20/50");
        assert_eq!(crossover_short_period("Crossover_20/50"), Some(20));
        assert_eq!(crossover_short_period("SMA_20"), None);
    }

    #[test]
    fn compute_appends_selected_columns() {
        let history = make_history(&(0..60).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        let out = compute_indicators(&history, &[Indicator::Sma(20), Indicator::Macd, Indicator::Rsi]);

        let names: Vec<&str> = out.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["SMA_20", "MACD", "Signal", "MACD_Hist", "RSI", "ΔVolume%"]
        );
        assert_eq!(out.column("SMA_20").unwrap().len(), 60);
        assert!(history.columns().is_empty(), "input must not be mutated");
    }

    #[test]
    fn compute_adds_crossovers_for_consecutive_sma_pairs() {
        let history = make_history(&(0..30).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        let out = compute_indicators(
            &history,
            &[Indicator::Sma(20), Indicator::Sma(5), Indicator::Sma(10), Indicator::Ema(5)],
        );

        assert!(out.has_column("Crossover_5/10"));
        assert!(out.has_column("Crossover_10/20"));
        assert!(!out.has_column("Crossover_5/20"));
    }

    #[test]
    fn compute_with_empty_selection_only_adds_volume_change() {
        let history = make_history(&[100.0, 101.0, 102.0]);
        let out = compute_indicators(&history, &[]);

        assert_eq!(out.columns().len(), 1);
        assert!(out.has_column(VOLUME_CHANGE_COLUMN));
    }

    #[test]
    fn overlay_adds_sma_and_ema() {
        let history = make_history(&(0..40).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        let out = with_overlay(&history, 30, OverlayAverages::default());

        let sma = out.column(OVERLAY_SMA_COLUMN).unwrap();
        assert!(sma[28].is_none());
        assert!(sma[29].is_some());
        assert!(out.column(OVERLAY_EMA_COLUMN).unwrap()[29].is_some());
    }

    #[test]
    fn overlay_adds_only_selected_average() {
        let history = make_history(&(0..40).map(|i| 100.0 + i as f64).collect::<Vec<_>>());

        let ema_only = with_overlay(&history, 30, OverlayAverages { sma: false, ema: true });
        assert!(!ema_only.has_column(OVERLAY_SMA_COLUMN));
        assert!(ema_only.has_column(OVERLAY_EMA_COLUMN));

        let sma_only = with_overlay(&history, 30, OverlayAverages { sma: true, ema: false });
        assert!(sma_only.has_column(OVERLAY_SMA_COLUMN));
        assert!(!sma_only.has_column(OVERLAY_EMA_COLUMN));
        assert!(!OverlayAverages { sma: false, ema: false }.any());
    }
}
