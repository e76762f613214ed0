//! Percent-change gauge for one security.

use crate::domain::chart::{
    Axis, Domain, Figure, Font, Gauge, GaugeBar, GaugeNumber, GaugeSpec, GaugeStep, Layout,
    Margin, Title, Trace, sign_color,
};
use crate::domain::history::CombinedHistory;

pub const GAUGE_RANGE: [f64; 2] = [-50.0, 50.0];
pub const GAUGE_HEIGHT: u32 = 150;

/// Gauge of the last percent change of `ticker`, or `None` when the
/// combined table has no rows for it.
pub fn gauge(combined: &CombinedHistory, ticker: &str) -> Option<Figure> {
    let last = combined.rows_for(ticker).last().copied()?;
    let value = last.pct_change * 100.0;
    let color = sign_color(value > 0.0);

    let trace = Gauge {
        mode: "gauge+number".into(),
        value,
        domain: Domain {
            x: [0.0, 1.0],
            y: [0.0, 1.0],
        },
        title: Title::new(ticker),
        number: GaugeNumber {
            font: Font {
                color: color.into(),
            },
        },
        gauge: GaugeSpec {
            axis: Axis {
                range: Some(GAUGE_RANGE),
                ..Axis::default()
            },
            bar: GaugeBar { thickness: 0.0 },
            steps: vec![GaugeStep {
                range: [0.0, value],
                color: color.into(),
                thickness: 0.8,
            }],
        },
    };

    Some(Figure {
        data: vec![Trace::Indicator(trace)],
        layout: Layout {
            height: Some(GAUGE_HEIGHT),
            margin: Some(Margin {
                t: 50,
                b: 0,
                l: 0,
                r: 0,
            }),
            ..Layout::default()
        },
    })
}
