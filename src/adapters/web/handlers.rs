//! HTTP request handlers for web adapter.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{DateTime, FixedOffset, Local};
use std::sync::{Arc, PoisonError};

use crate::domain::indicator::{Indicator, MAX_OVERLAY_SPAN, MIN_OVERLAY_SPAN};
use crate::domain::page::render_page;
use crate::domain::period::{Interval, Period};
use crate::domain::session::{PageInput, SessionState};
use crate::ports::page_port::PagePort;

use super::{AppState, WebError};

/// Sidebar inputs as query parameters. Absent values fall back to the
/// configured defaults; empty strings clear optional ones.
#[derive(Debug, Default, serde::Deserialize)]
pub struct DashboardQuery {
    pub tickers: Option<String>,
    pub period: Option<String>,
    pub interval: Option<String>,
    pub volume: Option<String>,
    pub indicators: Option<String>,
    pub overlay_span: Option<String>,
    pub overlay_sma: Option<String>,
    pub overlay_ema: Option<String>,
    pub dark_mode: Option<String>,
    pub refresh: Option<String>,
}

fn parse_flag(name: &str, value: &str) -> Result<bool, WebError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" => Ok(false),
        _ => Err(WebError::bad_request(format!("Invalid {}: {}", name, value))),
    }
}

impl DashboardQuery {
    pub fn to_input(&self, defaults: &PageInput) -> Result<PageInput, WebError> {
        let mut input = defaults.clone();

        if let Some(tickers) = &self.tickers {
            input.tickers = Some(tickers.clone());
        }
        if let Some(period) = &self.period {
            input.period = period
                .parse::<Period>()
                .map_err(|e| WebError::bad_request(format!("Invalid period: {}", e)))?;
            // A new period invalidates an interval chosen for the old one.
            input.interval = None;
        }
        if let Some(interval) = self.interval.as_deref().filter(|s| !s.trim().is_empty()) {
            input.interval = Some(
                interval
                    .parse::<Interval>()
                    .map_err(|e| WebError::bad_request(format!("Invalid interval: {}", e)))?,
            );
        }
        if let Some(volume) = &self.volume {
            input.volume = parse_flag("volume", volume)?;
        }
        if let Some(indicators) = &self.indicators {
            input.indicators = indicators
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    let indicator = s
                        .parse::<Indicator>()
                        .map_err(|e| WebError::bad_request(format!("Invalid indicator: {}", e)))?;
                    if indicator.is_selectable() {
                        Ok(indicator)
                    } else {
                        Err(WebError::bad_request(format!(
                            "Indicator {} is not available",
                            indicator
                        )))
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
        }
        if let Some(span) = &self.overlay_span {
            input.overlay_span = match span.trim() {
                "" => None,
                s => {
                    let span = s
                        .parse::<usize>()
                        .ok()
                        .filter(|v| (MIN_OVERLAY_SPAN..=MAX_OVERLAY_SPAN).contains(v))
                        .ok_or_else(|| {
                            WebError::bad_request(format!(
                                "Moving average span must be between {} and {}",
                                MIN_OVERLAY_SPAN, MAX_OVERLAY_SPAN
                            ))
                        })?;
                    Some(span)
                }
            };
        }
        if let Some(sma) = &self.overlay_sma {
            input.overlay_averages.sma = parse_flag("overlay_sma", sma)?;
        }
        if let Some(ema) = &self.overlay_ema {
            input.overlay_averages.ema = parse_flag("overlay_ema", ema)?;
        }
        if let Some(dark) = &self.dark_mode {
            input.dark_mode = Some(parse_flag("dark_mode", dark)?);
        }
        if let Some(refresh) = &self.refresh {
            input.refresh = parse_flag("refresh", refresh)?;
        }

        Ok(input)
    }
}

fn now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, WebError> {
    let input = query.to_input(&state.defaults.input)?;

    let html = tokio::task::spawn_blocking(move || {
        let now = now();
        let mut slot = state.session.lock().unwrap_or_else(PoisonError::into_inner);
        let session = SessionState::get_or_init(&mut slot, now);
        let page = render_page(&state.fetcher, session, &input, &state.defaults.overview, now);
        state.pages.render(&page)
    })
    .await
    .map_err(|e| WebError::internal(format!("render task failed: {}", e)))??;

    Ok(Html(html).into_response())
}

/// Drops every memoized result, stamps the session and returns to the page.
pub async fn refresh(State(state): State<Arc<AppState>>) -> Result<Response, WebError> {
    tokio::task::spawn_blocking(move || {
        let now = now();
        state.fetcher.clear_all();
        let mut slot = state.session.lock().unwrap_or_else(PoisonError::into_inner);
        SessionState::get_or_init(&mut slot, now).touch(now);
    })
    .await
    .map_err(|e| WebError::internal(format!("refresh task failed: {}", e)))?;

    Ok(Redirect::to("/").into_response())
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn not_found() -> WebError {
    WebError::not_found("Page not found")
}
