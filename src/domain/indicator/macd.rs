//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9.
//! The line is defined from bar slow-1; signal and histogram from
//! slow - 1 + signal - 1.

use crate::domain::indicator::Series;
use crate::domain::indicator::ema::calculate_ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Series,
    pub signal: Series,
    pub histogram: Series,
}

pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdSeries {
    let n = closes.len();
    if n == 0 || fast == 0 || slow == 0 || signal_period == 0 {
        return MacdSeries {
            line: vec![None; n],
            signal: vec![None; n],
            histogram: vec![None; n],
        };
    }

    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);
    let macd_warmup = fast.max(slow) - 1;

    let line: Series = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let k = 2.0 / (signal_period as f64 + 1.0);
    let mut signal: Series = vec![None; n];

    if macd_warmup + signal_period <= n {
        let seed: f64 = line[macd_warmup..macd_warmup + signal_period]
            .iter()
            .map(|v| v.unwrap_or(0.0))
            .sum();
        let mut signal_ema = seed / signal_period as f64;
        signal[macd_warmup + signal_period - 1] = Some(signal_ema);

        for i in (macd_warmup + signal_period)..n {
            signal_ema = line[i].unwrap_or(0.0) * k + signal_ema * (1.0 - k);
            signal[i] = Some(signal_ema);
        }
    }

    let histogram = line
        .iter()
        .zip(&signal)
        .map(|(l, s)| match (l, s) {
            (Some(l), Some(s)) => Some(l - s),
            _ => None,
        })
        .collect();

    MacdSeries {
        line,
        signal,
        histogram,
    }
}

pub fn calculate_macd_default(closes: &[f64]) -> MacdSeries {
    calculate_macd(closes, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
