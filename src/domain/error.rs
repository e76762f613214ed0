//! Domain error types.
//!
//! [`FetchError`] is the failure arm of every fetch result and is stored in the
//! memo cache alongside successes, so it is `Clone` and carries only strings.
//! [`DashboardError`] is the top-level error surfaced by the CLI.

/// Why a fetch operation failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("proxy list unavailable: {reason}")]
    Proxy { reason: String },

    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("provider error for {ticker}: {reason}")]
    Provider { ticker: String, reason: String },

    #[error("unexpected response for {ticker}: {reason}")]
    Decode { ticker: String, reason: String },

    #[error("no table found at {url}")]
    NoTable { url: String },

    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Result-or-error value returned by every fetch operation.
pub type FetchResult<T> = Result<T, FetchError>;

/// Top-level error type for marketdash.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        DashboardError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&DashboardError> for std::process::ExitCode {
    fn from(err: &DashboardError) -> Self {
        let code: u8 = match err {
            DashboardError::Io(_) => 1,
            DashboardError::ConfigParse { .. }
            | DashboardError::ConfigMissing { .. }
            | DashboardError::ConfigInvalid { .. } => 2,
            DashboardError::Fetch(_) => 3,
            DashboardError::InvalidInput { .. } => 4,
            DashboardError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
