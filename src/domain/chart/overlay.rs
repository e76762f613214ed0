//! Single-panel candlestick with the user time-span moving averages.

use crate::domain::chart::{
    Axis, BLACK, BLUE, Candlestick, Figure, Layout, Legend, Line, RangeSlider, Scatter, Title,
    Trace,
};
use crate::domain::history::PriceHistory;
use crate::domain::indicator::{OVERLAY_EMA_COLUMN, OVERLAY_SMA_COLUMN};

/// Candlestick plus the `SMA` (black) and `EMA` (blue) columns when present.
pub fn overlay(history: &PriceHistory, title: &str, span: usize) -> Figure {
    let x = history.labels();
    let mut data = vec![Trace::Candlestick(Candlestick {
        x: x.clone(),
        open: history.bars().iter().map(|b| b.open).collect(),
        high: history.bars().iter().map(|b| b.high).collect(),
        low: history.bars().iter().map(|b| b.low).collect(),
        close: history.closes(),
        name: "OHLC".into(),
        xaxis: None,
        yaxis: None,
    })];

    for (column, color) in [(OVERLAY_SMA_COLUMN, BLACK), (OVERLAY_EMA_COLUMN, BLUE)] {
        if let Some(values) = history.column(column) {
            data.push(Trace::Scatter(
                Scatter::new(format!("{}{}", span, column), x.clone(), values.to_vec())
                    .lines()
                    .with_line(Line::solid(Some(color), 2.0)),
            ));
        }
    }

    let mut layout = Layout {
        title: Some(Title::new(title)),
        showlegend: Some(true),
        legend: Some(Legend::below(-0.3)),
        ..Layout::default()
    };
    layout.axes.insert(
        "xaxis".into(),
        Axis {
            rangeslider: Some(RangeSlider {
                visible: false,
                thickness: None,
            }),
            ..Axis::titled("Date")
        },
    );
    layout.axes.insert("yaxis".into(), Axis::titled("Price"));

    Figure { data, layout }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{OverlayAverages, with_overlay};
    use crate::domain::ohlcv::Bar;
    use chrono::{DateTime, Duration};

    fn make_history(n: usize) -> PriceHistory {
        let start = DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap();
        let bars = (0..n)
            .map(|i| Bar {
                timestamp: start + Duration::days(i as i64),
                open: 100.0,
                high: 102.0,
                low: 98.0,
                close: 100.0 + i as f64,
                volume: 1000,
            })
            .collect();
        PriceHistory::new("TEST", bars)
    }

    #[test]
    fn overlay_adds_colored_averages() {
        let history = with_overlay(&make_history(40), 30, OverlayAverages::default());
        let fig = overlay(&history, "TEST", 30);

        assert_eq!(fig.data.len(), 3);
        let Trace::Scatter(sma) = &fig.data[1] else {
            panic!("expected SMA scatter");
        };
        assert_eq!(sma.name, "30SMA");
        assert_eq!(sma.line.as_ref().unwrap().color.as_deref(), Some("black"));
        let Trace::Scatter(ema) = &fig.data[2] else {
            panic!("expected EMA scatter");
        };
        assert_eq!(ema.line.as_ref().unwrap().color.as_deref(), Some("blue"));
    }

    #[test]
    fn overlay_with_ema_only() {
        let averages = OverlayAverages { sma: false, ema: true };
        let fig = overlay(&with_overlay(&make_history(40), 30, averages), "TEST", 30);

        assert_eq!(fig.data.len(), 2);
        let Trace::Scatter(ema) = &fig.data[1] else {
            panic!("expected EMA scatter");
        };
        assert_eq!(ema.name, "30EMA");
    }

    #[test]
    fn overlay_without_averages_is_candles_only() {
        let fig = overlay(&make_history(5), "TEST", 30);

        assert_eq!(fig.data.len(), 1);
        assert!(matches!(fig.data[0], Trace::Candlestick(_)));
        assert_eq!(
            fig.layout.axis("xaxis").unwrap().rangeslider.as_ref().map(|r| r.visible),
            Some(false)
        );
    }
}
