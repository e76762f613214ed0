//! Web server adapter.
//!
//! Serves the dashboard page over HTTP with Axum. One fetcher and one
//! session are shared by every request: there is no per-user isolation.

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::*;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::{Arc, Mutex};

use crate::adapters::html_page_adapter::HtmlPageAdapter;
use crate::domain::fetch::Fetcher;
use crate::domain::session::SessionState;
use crate::domain::settings::DashboardSettings;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8501";

pub struct AppState {
    pub fetcher: Arc<Fetcher>,
    pub session: Mutex<Option<SessionState>>,
    /// Values used for query parameters the request leaves out.
    pub defaults: DashboardSettings,
    pub pages: HtmlPageAdapter,
}

impl AppState {
    pub fn new(fetcher: Fetcher, defaults: DashboardSettings) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            session: Mutex::new(None),
            defaults,
            pages: HtmlPageAdapter::interactive(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/refresh", post(handlers::refresh))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}
