//! OHLCV bar and split event representation.

use chrono::{DateTime, FixedOffset};

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn is_up(&self) -> bool {
        self.close > self.open
    }

    /// Axis label used for chart x values.
    pub fn label(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// A stock split event, e.g. 2:1 is numerator 2, denominator 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub timestamp: DateTime<FixedOffset>,
    pub numerator: f64,
    pub denominator: f64,
}

impl Split {
    pub fn ratio(&self) -> f64 {
        if self.denominator == 0.0 {
            0.0
        } else {
            self.numerator / self.denominator
        }
    }
}
