//! Chart specifications in Plotly's JSON figure schema.
//!
//! Builders are pure functions from tabular data to a [`Figure`]; rendering
//! happens in the browser. Only the parts of the schema the dashboard uses
//! are modelled. Optional attributes are omitted from the JSON when unset so
//! Plotly applies its own defaults.

pub mod comparison;
pub mod gauge;
pub mod overlay;
pub mod panels;
pub mod table;

use serde::Serialize;
use std::collections::BTreeMap;

pub const GREEN: &str = "green";
pub const RED: &str = "red";
pub const BLACK: &str = "black";
pub const BLUE: &str = "blue";
pub const LIGHT_GREY: &str = "lightgrey";
pub const WHITE: &str = "white";

/// Up/down color: green when `positive`, red otherwise.
pub fn sign_color(positive: bool) -> &'static str {
    if positive { GREEN } else { RED }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Traces drawn against the y axis `axis` (`"y"`, `"y2"`, ...).
    pub fn traces_on<'a>(&'a self, axis: &'a str) -> impl Iterator<Item = &'a Trace> + 'a {
        self.data
            .iter()
            .filter(move |t| t.yaxis().unwrap_or("y") == axis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Candlestick(Candlestick),
    Scatter(Scatter),
    Bar(Bar),
    Indicator(Gauge),
    Table(TableTrace),
}

impl Trace {
    pub fn name(&self) -> Option<&str> {
        match self {
            Trace::Candlestick(t) => Some(&t.name),
            Trace::Scatter(t) => Some(&t.name),
            Trace::Bar(t) => Some(&t.name),
            Trace::Indicator(_) | Trace::Table(_) => None,
        }
    }

    pub fn yaxis(&self) -> Option<&str> {
        match self {
            Trace::Candlestick(t) => t.yaxis.as_deref(),
            Trace::Scatter(t) => t.yaxis.as_deref(),
            Trace::Bar(t) => t.yaxis.as_deref(),
            Trace::Indicator(_) | Trace::Table(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candlestick {
    pub x: Vec<String>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scatter {
    pub x: Vec<String>,
    pub y: Vec<Option<f64>>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<String>,
}

impl Scatter {
    pub fn new(name: impl Into<String>, x: Vec<String>, y: Vec<Option<f64>>) -> Self {
        Self {
            x,
            y,
            name: name.into(),
            mode: None,
            line: None,
            meta: None,
            hovertemplate: None,
            xaxis: None,
            yaxis: None,
        }
    }

    pub fn lines(mut self) -> Self {
        self.mode = Some("lines".into());
        self
    }

    pub fn with_line(mut self, line: Line) -> Self {
        self.line = Some(line);
        self
    }

    pub fn on_axis(mut self, axis: String) -> Self {
        self.yaxis = Some(axis);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub x: Vec<String>,
    pub y: Vec<Option<f64>>,
    pub name: String,
    pub marker: Marker,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customdata: Option<Vec<Vec<Option<f64>>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub color: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<String>,
}

impl Line {
    pub fn solid(color: Option<&str>, width: f64) -> Self {
        Self {
            color: color.map(str::to_string),
            width: Some(width),
            dash: None,
        }
    }

    pub fn dashed() -> Self {
        Self {
            dash: Some("dash".into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gauge {
    pub mode: String,
    pub value: f64,
    pub domain: Domain,
    pub title: Title,
    pub number: GaugeNumber,
    pub gauge: GaugeSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Domain {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeNumber {
    pub font: Font,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeSpec {
    pub axis: Axis,
    pub bar: GaugeBar,
    pub steps: Vec<GaugeStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeBar {
    pub thickness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeStep {
    pub range: [f64; 2],
    pub color: String,
    pub thickness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableTrace {
    pub header: TableSection,
    pub cells: TableSection,
    pub columnwidth: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSection {
    pub values: Vec<Vec<String>>,
    pub fill: Fill,
    pub align: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fill {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovermode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margin>,
    /// `xaxis`, `yaxis`, `yaxis2`, ... keyed by their layout attribute name.
    #[serde(flatten)]
    pub axes: BTreeMap<String, Axis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shapes: Vec<Shape>,
}

impl Layout {
    pub fn axis(&self, key: &str) -> Option<&Axis> {
        self.axes.get(key)
    }

    pub fn axis_mut(&mut self, key: &str) -> &mut Axis {
        self.axes.entry(key.to_string()).or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub orientation: String,
    pub yanchor: String,
    pub y: f64,
    pub xanchor: String,
    pub x: f64,
}

impl Legend {
    /// Horizontal legend centered below the plot area.
    pub fn below(y: f64) -> Self {
        Self {
            orientation: "h".into(),
            yanchor: "top".into(),
            y,
            xanchor: "center".into(),
            x: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margin {
    pub t: u32,
    pub b: u32,
    pub l: u32,
    pub r: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickformat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showspikes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spikemode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spikesnap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spikecolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spikethickness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showgrid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rangeslider: Option<RangeSlider>,
}

impl Axis {
    pub fn titled(text: impl Into<String>) -> Self {
        Self {
            title: Some(Title::new(text)),
            ..Self::default()
        }
    }

    /// Crosshair spike lines drawn across the whole plot, following the cursor.
    pub fn with_spikes(mut self) -> Self {
        self.showspikes = Some(true);
        self.spikemode = Some("across".into());
        self.spikesnap = Some("cursor".into());
        self.showline = Some(true);
        self.showgrid = Some(true);
        self.spikecolor = Some(BLACK.into());
        self.spikethickness = Some(1.0);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSlider {
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thickness: Option<f64>,
}

/// Annotation x position: a category label on the x axis or a fraction of
/// the axis domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Coord {
    Category(String),
    Fraction(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub x: Coord,
    pub y: f64,
    pub xref: String,
    pub yref: String,
    pub text: String,
    pub showarrow: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrowhead: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrowsize: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xanchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yanchor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    #[serde(rename = "type")]
    pub kind: String,
    pub xref: String,
    pub yref: String,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fillcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
}

impl Shape {
    /// Dashed horizontal line spanning the full width of the `yref` panel.
    pub fn hline(y: f64, yref: &str) -> Self {
        Self {
            kind: "line".into(),
            xref: "x domain".into(),
            yref: yref.into(),
            x0: 0.0,
            x1: 1.0,
            y0: y,
            y1: y,
            line: Some(Line::dashed()),
            fillcolor: None,
            opacity: None,
            layer: None,
        }
    }

    /// Filled band between `y0` and `y1` across the `yref` panel.
    pub fn hrect(y0: f64, y1: f64, yref: &str, color: &str, opacity: f64) -> Self {
        Self {
            kind: "rect".into(),
            xref: "x domain".into(),
            yref: yref.into(),
            x0: 0.0,
            x1: 1.0,
            y0,
            y1,
            line: Some(Line {
                width: Some(0.0),
                ..Line::default()
            }),
            fillcolor: Some(color.into()),
            opacity: Some(opacity),
            layer: Some("below".into()),
        }
    }
}

/// Trace reference for subplot row `row` (1-based): `y`, `y2`, ...
pub fn axis_ref(row: usize) -> String {
    if row <= 1 { "y".to_string() } else { format!("y{}", row) }
}

/// Layout key for subplot row `row` (1-based): `yaxis`, `yaxis2`, ...
pub fn axis_key(row: usize) -> String {
    if row <= 1 {
        "yaxis".to_string()
    } else {
        format!("yaxis{}", row)
    }
}

/// Vertical domains for stacked rows, top row first.
///
/// Each row's height is proportional to its weight after `spacing` is
/// removed between adjacent rows.
pub fn row_domains(weights: &[f64], spacing: f64) -> Vec<[f64; 2]> {
    if weights.is_empty() {
        return Vec::new();
    }
    let total: f64 = weights.iter().sum();
    let usable = 1.0 - spacing * (weights.len() - 1) as f64;

    let mut top = 1.0;
    let mut domains = Vec::with_capacity(weights.len());
    for (i, w) in weights.iter().enumerate() {
        let height = if total > 0.0 { usable * w / total } else { 0.0 };
        let bottom = if i + 1 == weights.len() { 0.0 } else { (top - height).max(0.0) };
        domains.push([bottom, top]);
        top = bottom - spacing;
    }
    domains
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn axis_names() {
        assert_eq!(axis_ref(1), "y");
        assert_eq!(axis_ref(3), "y3");
        assert_eq!(axis_key(1), "yaxis");
        assert_eq!(axis_key(2), "yaxis2");
    }

    #[test]
    fn row_domains_respect_weights_and_spacing() {
        let domains = row_domains(&[7.0, 3.0], 0.01);

        assert_eq!(domains.len(), 2);
        assert_relative_eq!(domains[0][1], 1.0);
        assert_relative_eq!(domains[0][0], 1.0 - 0.99 * 0.7, epsilon = 1e-9);
        assert_relative_eq!(domains[1][1], domains[0][0] - 0.01, epsilon = 1e-9);
        assert_relative_eq!(domains[1][0], 0.0);
    }

    #[test]
    fn single_row_fills_the_plot() {
        assert_eq!(row_domains(&[7.0], 0.01), vec![[0.0, 1.0]]);
    }

    #[test]
    fn trace_serializes_with_type_tag() {
        let trace = Trace::Scatter(Scatter::new("SMA_20", vec!["a".into()], vec![None]).lines());
        let json = serde_json::to_value(&trace).unwrap();

        assert_eq!(json["type"], "scatter");
        assert_eq!(json["mode"], "lines");
        assert!(json["y"][0].is_null());
        assert!(json.get("line").is_none());
    }

    #[test]
    fn layout_flattens_axes() {
        let mut layout = Layout::default();
        layout.axis_mut("yaxis2").title = Some(Title::new("RSI"));
        let json = serde_json::to_value(&layout).unwrap();

        assert_eq!(json["yaxis2"]["title"]["text"], "RSI");
        assert!(json.get("annotations").is_none());
    }
}
