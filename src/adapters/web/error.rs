//! HTTP error responses for web adapter.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::domain::error::DashboardError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &DashboardError) -> StatusCode {
    match err {
        DashboardError::ConfigMissing { .. }
        | DashboardError::ConfigInvalid { .. }
        | DashboardError::ConfigParse { .. }
        | DashboardError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        DashboardError::NoData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DashboardError::Fetch(_) => StatusCode::BAD_GATEWAY,
        DashboardError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DashboardError> for WebError {
    fn from(err: DashboardError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            log::error!("{}: {}", self.status, self.message);
        } else {
            log::warn!("{}: {}", self.status, self.message);
        }
        let body = format!(
            "<!DOCTYPE html><html><head><title>Error {}</title></head><body><h1>Error {}</h1><p>{}</p><p><a href=\"/\">Back to dashboard</a></p></body></html>",
            self.status.as_u16(),
            self.status.as_u16(),
            escape(&self.message)
        );
        (self.status, Html(body)).into_response()
    }
}
