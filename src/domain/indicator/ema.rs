//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) values are `None`.

use crate::domain::indicator::Series;

pub fn calculate_ema(values: &[f64], period: usize) -> Series {
    if period == 0 || values.is_empty() {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, &value) in values.iter().enumerate() {
        if i < period - 1 {
            sum += value;
            out.push(None);
        } else if i == period - 1 {
            sum += value;
            ema = sum / period as f64;
            out.push(Some(ema));
        } else {
            ema = value * k + ema * (1.0 - k);
            out.push(Some(ema));
        }
    }

    out
}
