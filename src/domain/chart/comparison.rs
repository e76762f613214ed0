//! Multi-security percent-change line chart.

use crate::domain::chart::{Axis, Figure, Layout, Legend, RangeSlider, Scatter, Shape, Title, Trace};
use crate::domain::history::CombinedHistory;

pub const CHART_HEIGHT: u32 = 800;

/// One line per ticker (ordered by ticker) with a dashed zero line and a
/// crosshair hover shared across all series.
pub fn comparison(combined: &CombinedHistory, title: &str) -> Figure {
    let data = combined
        .grouped()
        .into_iter()
        .map(|(ticker, rows)| {
            let mut line = Scatter::new(
                ticker,
                rows.iter().map(|r| r.label.clone()).collect(),
                rows.iter().map(|r| Some(r.pct_change)).collect(),
            )
            .lines();
            line.meta = Some(ticker.to_string());
            line.hovertemplate = Some("%{meta}: %{y:.2f}<br><extra></extra>".into());
            Trace::Scatter(line)
        })
        .collect();

    let mut zero = Shape::hline(0.0, "y");
    zero.xref = "paper".into();

    let mut layout = Layout {
        title: Some(Title::new(title)),
        height: Some(CHART_HEIGHT),
        showlegend: Some(true),
        legend: Some(Legend::below(-0.3)),
        hovermode: Some("x".into()),
        shapes: vec![zero],
        ..Layout::default()
    };
    layout.axes.insert(
        "xaxis".into(),
        Axis {
            rangeslider: Some(RangeSlider {
                visible: true,
                thickness: Some(0.1),
            }),
            ..Axis::titled("Date").with_spikes()
        },
    );
    layout.axes.insert(
        "yaxis".into(),
        Axis {
            tickformat: Some(".0%".into()),
            side: Some("right".into()),
            ..Axis::titled("Percentage change").with_spikes()
        },
    );

    Figure { data, layout }
}
