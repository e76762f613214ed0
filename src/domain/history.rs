//! Price history table and the multi-security combined view.
//!
//! A [`PriceHistory`] holds chronologically ordered bars plus any number of
//! appended indicator columns, each aligned row-for-row with the bars. Rows are
//! never mutated after construction; indicator computation returns a new table.

use crate::domain::ohlcv::Bar;
use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    ticker: String,
    bars: Vec<Bar>,
    columns: Vec<Column>,
}

impl PriceHistory {
    /// Sorts bars by timestamp and drops duplicate timestamps, keeping the
    /// last occurrence, so timestamps are strictly increasing.
    pub fn new(ticker: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        let mut unique: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match unique.last_mut() {
                Some(prev) if prev.timestamp == bar.timestamp => *prev = bar,
                _ => unique.push(bar),
            }
        }
        Self {
            ticker: ticker.into(),
            bars: unique,
            columns: Vec::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Appends (or replaces) a column. Values are padded with `None` or
    /// truncated to the row count.
    pub fn with_column(mut self, name: impl Into<String>, mut values: Vec<Option<f64>>) -> Self {
        let name = name.into();
        values.resize(self.bars.len(), None);
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column { name, values }),
        }
        self
    }

    /// Keeps only the rows at or after `start`. Appended columns are dropped.
    pub fn since(&self, start: DateTime<FixedOffset>) -> PriceHistory {
        PriceHistory {
            ticker: self.ticker.clone(),
            bars: self
                .bars
                .iter()
                .filter(|b| b.timestamp >= start)
                .cloned()
                .collect(),
            columns: Vec::new(),
        }
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.bars.iter().map(Bar::label).collect()
    }

    /// Close relative to the first row of the window: close[i] / close[0] - 1.
    pub fn pct_change(&self) -> Vec<f64> {
        let base = match self.bars.first() {
            Some(bar) if bar.close != 0.0 => bar.close,
            _ => return vec![0.0; self.bars.len()],
        };
        self.bars.iter().map(|b| b.close / base - 1.0).collect()
    }
}

/// One row of the multi-security table.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerRow {
    pub ticker: String,
    pub label: String,
    pub close: f64,
    pub pct_change: f64,
}

/// Rows of several securities stacked into one table, tagged by ticker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedHistory {
    rows: Vec<TickerRow>,
}

impl CombinedHistory {
    pub fn from_histories<'a, I>(histories: I) -> Self
    where
        I: IntoIterator<Item = &'a PriceHistory>,
    {
        let mut rows = Vec::new();
        for history in histories {
            let pct = history.pct_change();
            for (bar, pct_change) in history.bars().iter().zip(pct) {
                rows.push(TickerRow {
                    ticker: history.ticker().to_string(),
                    label: bar.label(),
                    close: bar.close,
                    pct_change,
                });
            }
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[TickerRow] {
        &self.rows
    }

    pub fn rows_for(&self, ticker: &str) -> Vec<&TickerRow> {
        self.rows.iter().filter(|r| r.ticker == ticker).collect()
    }

    /// Rows grouped by ticker, ordered by ticker.
    pub fn grouped(&self) -> BTreeMap<&str, Vec<&TickerRow>> {
        let mut groups: BTreeMap<&str, Vec<&TickerRow>> = BTreeMap::new();
        for row in &self.rows {
            groups.entry(row.ticker.as_str()).or_default().push(row);
        }
        groups
    }
}
