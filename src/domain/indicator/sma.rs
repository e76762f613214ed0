//! Simple Moving Average over a rolling window of n values.

use crate::domain::indicator::Series;

pub fn calculate_sma(values: &[f64], period: usize) -> Series {
    if period == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;

    for (i, &value) in values.iter().enumerate() {
        sum += value;
        if i >= period {
            sum -= values[i - period];
        }
        if i + 1 >= period {
            out.push(Some(sum / period as f64));
        } else {
            out.push(None);
        }
    }

    out
}
