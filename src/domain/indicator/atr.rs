//! Average True Range with Wilder smoothing.
//!
//! TR[0] = high - low; TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|).
//! Seed at bar n-1 is the mean of the first n true ranges, then
//! ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n.

use crate::domain::indicator::Series;
use crate::domain::ohlcv::Bar;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_atr(bars: &[Bar], period: usize) -> Series {
    if period == 0 || bars.len() < period {
        return vec![None; bars.len()];
    }

    let tr_values: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    let mut out = Vec::with_capacity(bars.len());
    let mut atr = 0.0;

    for (i, tr) in tr_values.iter().enumerate() {
        if i < period - 1 {
            out.push(None);
        } else if i == period - 1 {
            atr = tr_values[..period].iter().sum::<f64>() / period as f64;
            out.push(Some(atr));
        } else {
            atr = (atr * (period - 1) as f64 + tr) / period as f64;
            out.push(Some(atr));
        }
    }

    out
}
