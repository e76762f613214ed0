//! HTML page adapter implementing PagePort.
//!
//! Renders a [`Page`] through an Askama template into one self-contained
//! document. Figures are embedded as JSON and drawn by Plotly in the browser.

use std::fs;
use std::path::Path;

use askama::Template;

use crate::domain::error::DashboardError;
use crate::domain::indicator::Indicator;
use crate::domain::page::{Item, Page};
use crate::domain::period::{Interval, Period};
use crate::ports::page_port::PagePort;

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

pub struct NoticeView {
    pub level: &'static str,
    pub message: String,
}

pub struct ChartView {
    pub id: String,
    pub json: String,
}

pub enum ItemView {
    Notice(NoticeView),
    Chart(ChartView),
}

pub struct SectionView {
    pub heading: String,
    pub items: Vec<ItemView>,
}

pub struct OptionView {
    pub value: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "page.html")]
struct PageTemplate<'a> {
    title: &'a str,
    last_update: String,
    dark_mode: bool,
    interactive: bool,
    plotly_src: &'a str,
    ticker_text: &'a str,
    periods: Vec<OptionView>,
    intervals: Vec<OptionView>,
    indicators: String,
    indicator_choices: String,
    volume: bool,
    overlay_span: String,
    overlay_sma: bool,
    overlay_ema: bool,
    notices: Vec<NoticeView>,
    sections: Vec<SectionView>,
}

/// Figure JSON safe to embed in a `<script>` element.
fn script_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn section_views(page: &Page) -> Result<Vec<SectionView>, DashboardError> {
    page.sections
        .iter()
        .map(|section| {
            let items = section
                .items
                .iter()
                .map(|item| match item {
                    Item::Notice(n) => Ok(ItemView::Notice(NoticeView {
                        level: n.level.as_str(),
                        message: n.message.clone(),
                    })),
                    Item::Chart(c) => {
                        let json = c.figure.to_json().map_err(|e| DashboardError::InvalidInput {
                            reason: format!("figure {} could not be serialized: {}", c.id, e),
                        })?;
                        Ok(ItemView::Chart(ChartView {
                            id: c.id.clone(),
                            json: script_json(&json),
                        }))
                    }
                })
                .collect::<Result<Vec<_>, DashboardError>>()?;
            Ok(SectionView {
                heading: section.heading.clone(),
                items,
            })
        })
        .collect()
}

pub struct HtmlPageAdapter {
    plotly_src: String,
    interactive: bool,
}

impl HtmlPageAdapter {
    pub fn new() -> Self {
        Self {
            plotly_src: PLOTLY_CDN.to_string(),
            interactive: false,
        }
    }

    /// Includes the sidebar form and refresh button, for pages served over HTTP.
    pub fn interactive() -> Self {
        Self {
            interactive: true,
            ..Self::new()
        }
    }

    pub fn with_plotly_src(mut self, src: impl Into<String>) -> Self {
        self.plotly_src = src.into();
        self
    }
}

impl Default for HtmlPageAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PagePort for HtmlPageAdapter {
    fn render(&self, page: &Page) -> Result<String, DashboardError> {
        let template = PageTemplate {
            title: &page.title,
            last_update: page.last_update.format("%Y-%m-%d %H:%M:%S").to_string(),
            dark_mode: page.dark_mode,
            interactive: self.interactive,
            plotly_src: &self.plotly_src,
            ticker_text: &page.ticker_text,
            periods: Period::ALL
                .iter()
                .map(|p| OptionView {
                    value: p.to_string(),
                    selected: *p == page.period,
                })
                .collect(),
            intervals: Interval::choices_for(page.period)
                .iter()
                .map(|i| OptionView {
                    value: i.to_string(),
                    selected: *i == page.interval,
                })
                .collect(),
            indicators: page
                .indicators
                .iter()
                .map(Indicator::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            indicator_choices: Indicator::SELECTABLE
                .iter()
                .map(Indicator::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            volume: page.volume,
            overlay_span: page.overlay_span.map(|s| s.to_string()).unwrap_or_default(),
            overlay_sma: page.overlay_averages.sma,
            overlay_ema: page.overlay_averages.ema,
            notices: page
                .notices
                .iter()
                .map(|n| NoticeView {
                    level: n.level.as_str(),
                    message: n.message.clone(),
                })
                .collect(),
            sections: section_views(page)?,
        };

        template
            .render()
            .map_err(|e| DashboardError::Io(std::io::Error::other(e.to_string())))
    }

    fn write(&self, page: &Page, output_path: &str) -> Result<(), DashboardError> {
        let html = self.render(page)?;

        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(DashboardError::Io)?;
        }
        fs::write(path, html).map_err(DashboardError::Io)?;
        log::info!("wrote dashboard to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::table::table_figure;
    use crate::domain::indicator::OverlayAverages;
    use crate::domain::page::{Notice, Section, PAGE_TITLE};
    use crate::domain::table::Table;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn sample_page() -> Page {
        let table = Table::new(
            vec!["Field".into(), "Value".into()],
            vec![vec!["Name".into(), "</script><b>x</b>".into()]],
        );
        let mut section = Section::new("Security: TATA MOTORS");
        section.push(Item::Notice(Notice::warning("No splits recorded")));
        section.push(Item::chart("info-tatamotors-ns", table_figure(&table)));

        Page {
            title: PAGE_TITLE.to_string(),
            last_update: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            dark_mode: true,
            ticker_text: "TATAMOTORS.NS".into(),
            tickers: vec!["TATAMOTORS.NS".into()],
            period: Period::OneYear,
            interval: Interval::OneWeek,
            volume: true,
            indicators: vec![Indicator::Sma(20), Indicator::Rsi],
            overlay_span: Some(30),
            overlay_averages: OverlayAverages::default(),
            notices: vec![Notice::error("Only first 10 tickers are shown")],
            sections: vec![section],
        }
    }

    #[test]
    fn render_includes_sections_and_notices() {
        let html = HtmlPageAdapter::new().render(&sample_page()).unwrap();

        assert!(html.contains("Stock Market Dashboard"));
        assert!(html.contains("Last update: 2024-03-01 09:30:00"));
        assert!(html.contains("Security: TATA MOTORS"));
        assert!(html.contains("Only first 10 tickers are shown"));
        assert!(html.contains("notice warning"));
        assert!(html.contains("id=\"info-tatamotors-ns\""));
        assert!(html.contains(PLOTLY_CDN));
        assert!(html.contains("class=\"dark\""));
    }

    #[test]
    fn embedded_json_cannot_close_the_script() {
        let html = HtmlPageAdapter::new().render(&sample_page()).unwrap();
        assert!(!html.contains("</script><b>"));
        assert!(html.contains("<\\/script>"));
    }

    #[test]
    fn sidebar_only_when_interactive() {
        let page = sample_page();
        let static_html = HtmlPageAdapter::new().render(&page).unwrap();
        let served_html = HtmlPageAdapter::interactive().render(&page).unwrap();

        assert!(!static_html.contains("<form"));
        assert!(served_html.contains("<form"));
        assert!(served_html.contains("action=\"/refresh\""));
        assert!(served_html.contains("value=\"SMA_20, RSI\""));
        assert!(served_html.contains("<option value=\"1y\" selected>"));
        assert!(served_html.contains("<option value=\"1wk\" selected>"));
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out").join("dashboard.html");

        HtmlPageAdapter::new()
            .write(&sample_page(), output.to_str().unwrap())
            .unwrap();

        let contents = fs::read_to_string(&output).unwrap();
        assert!(contents.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn custom_plotly_source() {
        let html = HtmlPageAdapter::new()
            .with_plotly_src("/static/plotly.js")
            .render(&sample_page())
            .unwrap();
        assert!(html.contains("src=\"/static/plotly.js\""));
    }
}
