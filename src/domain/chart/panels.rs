//! Candlestick chart with stacked indicator panels.
//!
//! Row 1 holds the candlestick, every `SMA*`/`EMA*` column and the crossover
//! annotations. One extra row is added per present panel in the fixed order
//! Volume, MACD, ATR, RSI. Rows share a single x axis drawn under the bottom
//! row.

use crate::domain::chart::{
    Annotation, Bar, Candlestick, Coord, Figure, Layout, Legend, Line, Marker, RangeSlider,
    Scatter, Shape, Title, Trace, BLUE, axis_key, axis_ref, row_domains, sign_color,
};
use crate::domain::history::PriceHistory;
use crate::domain::indicator::{
    ATR_COLUMN, MACD_COLUMN, MACD_HIST_COLUMN, RSI_COLUMN, SIGNAL_COLUMN, VOLUME_CHANGE_COLUMN,
    crossover_short_period,
};

pub const PRICE_ROW_WEIGHT: f64 = 7.0;
pub const PANEL_ROW_WEIGHT: f64 = 3.0;
pub const VERTICAL_SPACING: f64 = 0.01;
pub const CHART_HEIGHT: u32 = 800;
pub const RSI_UPPER: f64 = 70.0;
pub const RSI_LOWER: f64 = 30.0;
pub const CROSS_ARROW_OFFSET: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Volume,
    Macd,
    Atr,
    Rsi,
}

impl Panel {
    pub fn title(&self) -> &'static str {
        match self {
            Panel::Volume => "Volume",
            Panel::Macd => "MACD",
            Panel::Atr => "ATR",
            Panel::Rsi => "RSI",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelOptions {
    pub title: String,
    pub currency: String,
    pub volume: bool,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            currency: String::new(),
            volume: true,
        }
    }
}

/// Panels drawn under the price row, in display order.
pub fn panels_for(history: &PriceHistory, options: &PanelOptions) -> Vec<Panel> {
    let mut panels = Vec::new();
    if options.volume {
        panels.push(Panel::Volume);
    }
    if history.has_column(MACD_COLUMN) {
        panels.push(Panel::Macd);
    }
    if history.has_column(ATR_COLUMN) {
        panels.push(Panel::Atr);
    }
    if history.has_column(RSI_COLUMN) {
        panels.push(Panel::Rsi);
    }
    panels
}

pub fn panel_stack(history: &PriceHistory, options: &PanelOptions) -> Figure {
    let x = history.labels();
    let panels = panels_for(history, options);
    let rows = 1 + panels.len();

    let mut weights = vec![PRICE_ROW_WEIGHT];
    weights.extend(std::iter::repeat_n(PANEL_ROW_WEIGHT, panels.len()));
    let domains = row_domains(&weights, VERTICAL_SPACING);

    let mut data = Vec::new();
    let mut layout = Layout {
        title: Some(Title::new(options.title.clone())),
        height: Some(CHART_HEIGHT),
        showlegend: Some(true),
        legend: Some(Legend::below(-0.15)),
        ..Layout::default()
    };

    data.push(Trace::Candlestick(Candlestick {
        x: x.clone(),
        open: history.bars().iter().map(|b| b.open).collect(),
        high: history.bars().iter().map(|b| b.high).collect(),
        low: history.bars().iter().map(|b| b.low).collect(),
        close: history.closes(),
        name: "OHLC".into(),
        xaxis: None,
        yaxis: None,
    }));

    for column in history.columns() {
        if column.name.contains("SMA") || column.name.contains("EMA") {
            data.push(Trace::Scatter(
                Scatter::new(column.name.clone(), x.clone(), column.values.clone())
                    .lines()
                    .with_line(Line::solid(None, 2.0)),
            ));
        }
    }

    layout.annotations.extend(crossover_annotations(history, &x));

    for (i, panel) in panels.iter().enumerate() {
        let axis = axis_ref(i + 2);
        match panel {
            Panel::Volume => data.push(volume_trace(history, &x, &axis)),
            Panel::Macd => data.extend(macd_traces(history, &x, &axis)),
            Panel::Atr => data.push(line_trace(history, ATR_COLUMN, &x, &axis)),
            Panel::Rsi => {
                data.push(line_trace(history, RSI_COLUMN, &x, &axis));
                layout.shapes.push(Shape::hline(RSI_UPPER, &axis));
                layout.shapes.push(Shape::hline(RSI_LOWER, &axis));
                layout.shapes.push(Shape::hrect(RSI_LOWER, RSI_UPPER, &axis, BLUE, 0.25));
                layout.annotations.push(hline_label(RSI_UPPER, &axis, "top"));
                layout.annotations.push(hline_label(RSI_LOWER, &axis, "bottom"));
            }
        }
    }

    for (i, domain) in domains.iter().enumerate() {
        let row = i + 1;
        let axis = layout.axis_mut(&axis_key(row));
        axis.domain = Some(*domain);
        axis.anchor = Some("x".into());
        axis.title = Some(Title::new(if row == 1 {
            format!("Price (in {})", options.currency)
        } else {
            panels[i - 1].title().to_string()
        }));
    }

    let xaxis = layout.axis_mut("xaxis");
    xaxis.title = Some(Title::new("Date"));
    xaxis.anchor = Some(axis_ref(rows));
    xaxis.rangeslider = Some(RangeSlider {
        visible: false,
        thickness: None,
    });

    Figure { data, layout }
}

/// "Golden cross" above `SMA_<short>` where a crossover column is +1,
/// "Death cross" below it where it is -1.
fn crossover_annotations(history: &PriceHistory, x: &[String]) -> Vec<Annotation> {
    let mut annotations = Vec::new();

    for column in history.columns() {
        let Some(short) = crossover_short_period(&column.name) else {
            continue;
        };
        let Some(sma) = history.column(&format!("SMA_{}", short)) else {
            continue;
        };

        for (i, value) in column.values.iter().enumerate() {
            let (text, ay) = match value {
                Some(v) if *v == 1.0 => ("Golden cross", -CROSS_ARROW_OFFSET),
                Some(v) if *v == -1.0 => ("Death cross", CROSS_ARROW_OFFSET),
                _ => continue,
            };
            let Some(y) = sma.get(i).copied().flatten() else {
                continue;
            };
            annotations.push(Annotation {
                x: Coord::Category(x[i].clone()),
                y,
                xref: "x".into(),
                yref: "y".into(),
                text: text.into(),
                showarrow: true,
                arrowhead: Some(1),
                arrowsize: Some(1.0),
                ay: Some(ay),
                xanchor: None,
                yanchor: None,
            });
        }
    }

    annotations
}

fn volume_trace(history: &PriceHistory, x: &[String], axis: &str) -> Trace {
    let colors = history
        .bars()
        .iter()
        .map(|b| sign_color(b.is_up()).to_string())
        .collect();
    let deltas = match history.column(VOLUME_CHANGE_COLUMN) {
        Some(values) => values.iter().map(|v| vec![*v]).collect(),
        None => vec![vec![None]; history.len()],
    };

    Trace::Bar(Bar {
        x: x.to_vec(),
        y: history.bars().iter().map(|b| Some(b.volume as f64)).collect(),
        name: "Volume".into(),
        marker: Marker { color: colors },
        hovertemplate: Some(
            "%{x}<br>Volume: %{y}<br>ΔVolume: %{customdata[0]}<extra></extra>".into(),
        ),
        customdata: Some(deltas),
        xaxis: None,
        yaxis: Some(axis.to_string()),
    })
}

fn macd_traces(history: &PriceHistory, x: &[String], axis: &str) -> Vec<Trace> {
    let mut traces = vec![line_trace(history, MACD_COLUMN, x, axis)];

    if history.has_column(SIGNAL_COLUMN) {
        traces.push(line_trace(history, SIGNAL_COLUMN, x, axis));
    }

    if let Some(hist) = history.column(MACD_HIST_COLUMN) {
        traces.push(Trace::Bar(Bar {
            x: x.to_vec(),
            y: hist.to_vec(),
            name: MACD_HIST_COLUMN.into(),
            marker: Marker {
                color: hist
                    .iter()
                    .map(|v| sign_color(v.is_some_and(|v| v > 0.0)).to_string())
                    .collect(),
            },
            hovertemplate: None,
            customdata: None,
            xaxis: None,
            yaxis: Some(axis.to_string()),
        }));
    }

    traces
}

fn line_trace(history: &PriceHistory, column: &str, x: &[String], axis: &str) -> Trace {
    let values = history
        .column(column)
        .map(<[Option<f64>]>::to_vec)
        .unwrap_or_else(|| vec![None; history.len()]);
    Trace::Scatter(Scatter::new(column, x.to_vec(), values).on_axis(axis.to_string()))
}

fn hline_label(y: f64, yref: &str, text: &str) -> Annotation {
    Annotation {
        x: Coord::Fraction(1.0),
        y,
        xref: "x domain".into(),
        yref: yref.into(),
        text: text.into(),
        showarrow: false,
        arrowhead: None,
        arrowsize: None,
        ay: None,
        xanchor: Some("right".into()),
        yanchor: Some("bottom".into()),
    }
}

/// Y axis titles in row order.
pub fn axis_titles(figure: &Figure) -> Vec<String> {
    let mut titles = Vec::new();
    let mut row = 1;
    while let Some(axis) = figure.layout.axis(&axis_key(row)) {
        titles.push(axis.title.as_ref().map(|t| t.text.clone()).unwrap_or_default());
        row += 1;
    }
    titles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{Indicator, compute_indicators};
    use crate::domain::ohlcv::Bar as OhlcvBar;
    use chrono::{DateTime, Duration};

    fn make_history(n: usize) -> PriceHistory {
        let start = DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap();
        let bars = (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.7).sin() * 10.0;
                OhlcvBar {
                    timestamp: start + Duration::days(i as i64),
                    open: if i % 2 == 0 { close - 1.0 } else { close + 1.0 },
                    high: close + 2.0,
                    low: close - 2.0,
                    close,
                    volume: 1000 + i as u64 * 10,
                }
            })
            .collect();
        PriceHistory::new("TEST", bars)
    }

    #[test]
    fn price_only_without_volume() {
        let history = make_history(10);
        let options = PanelOptions {
            volume: false,
            ..PanelOptions::default()
        };
        let fig = panel_stack(&history, &options);

        assert_eq!(axis_titles(&fig), vec!["Price (in )"]);
        assert_eq!(fig.layout.axis("yaxis").unwrap().domain, Some([0.0, 1.0]));
        assert_eq!(fig.layout.axis("xaxis").unwrap().anchor.as_deref(), Some("y"));
    }

    #[test]
    fn panels_follow_fixed_order() {
        let history = compute_indicators(
            &make_history(60),
            &[Indicator::Rsi, Indicator::Atr, Indicator::Macd],
        );
        let options = PanelOptions {
            title: "Test".into(),
            currency: "INR".into(),
            volume: true,
        };
        let fig = panel_stack(&history, &options);

        assert_eq!(
            axis_titles(&fig),
            vec!["Price (in INR)", "Volume", "MACD", "ATR", "RSI"]
        );
        assert_eq!(fig.layout.axis("xaxis").unwrap().anchor.as_deref(), Some("y5"));
        assert_eq!(fig.layout.height, Some(800));
    }

    #[test]
    fn volume_colors_follow_close_vs_open() {
        let history = make_history(6);
        let fig = panel_stack(&history, &PanelOptions::default());

        let Some(Trace::Bar(volume)) = fig.traces_on("y2").next() else {
            panic!("expected volume bars on y2");
        };
        for (bar, color) in history.bars().iter().zip(&volume.marker.color) {
            let expected = if bar.close > bar.open { "green" } else { "red" };
            assert_eq!(color, expected);
        }
    }

    #[test]
    fn macd_panel_has_signal_and_histogram() {
        let history = compute_indicators(&make_history(60), &[Indicator::Macd]);
        let options = PanelOptions {
            volume: false,
            ..PanelOptions::default()
        };
        let fig = panel_stack(&history, &options);

        let names: Vec<&str> = fig.traces_on("y2").filter_map(Trace::name).collect();
        assert_eq!(names, vec!["MACD", "Signal", "MACD_Hist"]);
    }

    #[test]
    fn rsi_panel_has_reference_lines_and_band() {
        let history = compute_indicators(&make_history(30), &[Indicator::Rsi]);
        let options = PanelOptions {
            volume: false,
            ..PanelOptions::default()
        };
        let fig = panel_stack(&history, &options);

        let lines: Vec<f64> = fig
            .layout
            .shapes
            .iter()
            .filter(|s| s.kind == "line")
            .map(|s| s.y0)
            .collect();
        assert_eq!(lines, vec![70.0, 30.0]);

        let band = fig.layout.shapes.iter().find(|s| s.kind == "rect").unwrap();
        assert_eq!((band.y0, band.y1), (30.0, 70.0));
        assert_eq!(band.opacity, Some(0.25));
        assert_eq!(band.yref, "y2");
    }

    #[test]
    fn crossover_annotations_on_short_sma() {
        let history = make_history(5)
            .with_column("SMA_2", vec![None, Some(1.0), Some(2.0), Some(3.0), Some(4.0)])
            .with_column("SMA_3", vec![None; 5])
            .with_column(
                "Crossover_2/3",
                vec![None, Some(1.0), Some(0.0), Some(-1.0), Some(0.5)],
            );
        let fig = panel_stack(&history, &PanelOptions::default());

        let texts: Vec<(&str, f64)> = fig
            .layout
            .annotations
            .iter()
            .filter(|a| a.showarrow)
            .map(|a| (a.text.as_str(), a.y))
            .collect();
        assert_eq!(texts, vec![("Golden cross", 1.0), ("Death cross", 3.0)]);
    }

    #[test]
    fn moving_averages_drawn_on_price_row() {
        let history = compute_indicators(&make_history(30), &[Indicator::Sma(5), Indicator::Ema(10)]);
        let fig = panel_stack(&history, &PanelOptions::default());

        let names: Vec<&str> = fig.traces_on("y").filter_map(Trace::name).collect();
        assert_eq!(names, vec!["OHLC", "SMA_5", "EMA_10"]);
    }
}
