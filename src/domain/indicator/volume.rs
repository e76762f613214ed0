//! Bar-to-bar volume change in percent.

use crate::domain::indicator::Series;
use crate::domain::ohlcv::Bar;

pub fn calculate_volume_change(bars: &[Bar]) -> Series {
    let mut out = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let change = match i.checked_sub(1).map(|p| bars[p].volume) {
            Some(prev) if prev > 0 => Some((bar.volume as f64 - prev as f64) / prev as f64 * 100.0),
            _ => None,
        };
        out.push(change);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    fn make_bars(volumes: &[u64]) -> Vec<Bar> {
        let start = DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap();
        volumes
            .iter()
            .enumerate()
            .map(|(i, &volume)| Bar {
                timestamp: start + Duration::days(i as i64),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume,
            })
            .collect()
    }

    #[test]
    fn volume_change_percent() {
        let series = calculate_volume_change(&make_bars(&[1000, 1500, 750]));

        assert_eq!(series[0], None);
        assert!((series[1].unwrap() - 50.0).abs() < 1e-9);
        assert!((series[2].unwrap() + 50.0).abs() < 1e-9);
    }

    #[test]
    fn zero_previous_volume_is_undefined() {
        let series = calculate_volume_change(&make_bars(&[0, 1500]));
        assert_eq!(series, vec![None, None]);
    }
}
