//! Moving-average crossover markers.
//!
//! +1 where the short average moves from at-or-below to above the long
//! average, -1 for the opposite move, 0 otherwise. Bars where either
//! average (or its predecessor) is undefined are `None`.

use crate::domain::indicator::Series;

pub fn calculate_crossover(short: &[Option<f64>], long: &[Option<f64>]) -> Series {
    let n = short.len().min(long.len());
    let mut out = Vec::with_capacity(n);

    for i in 0..n {
        if i == 0 {
            out.push(None);
            continue;
        }
        let signal = match (short[i - 1], long[i - 1], short[i], long[i]) {
            (Some(ps), Some(pl), Some(s), Some(l)) => {
                if ps <= pl && s > l {
                    Some(1.0)
                } else if ps >= pl && s < l {
                    Some(-1.0)
                } else {
                    Some(0.0)
                }
            }
            _ => None,
        };
        out.push(signal);
    }

    out
}
