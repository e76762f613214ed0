//! Proxy list providers and the selector built from `[proxy]`.

use crate::domain::error::{DashboardError, FetchError, FetchResult};
use crate::domain::proxy::{DEFAULT_PROBABILITY, DEFAULT_SCHEME, ProxyRoute, ProxySelector};
use crate::ports::config_port::ConfigPort;
use crate::ports::proxy_port::ProxySource;
use std::time::Duration;

pub const DEFAULT_LIST_URL: &str =
    "https://api.proxyscrape.com/v2/?request=getproxies&protocol=http&timeout=10000&country=all&ssl=all&anonymity=all";

/// Downloads a plain-text `ip:port` list, one endpoint per line, on every call.
pub struct HttpProxyList {
    list_url: String,
    timeout: Option<Duration>,
}

impl HttpProxyList {
    pub fn new(list_url: impl Into<String>) -> Self {
        Self {
            list_url: list_url.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn list_url(&self) -> &str {
        &self.list_url
    }

    fn http_error(&self, reason: impl ToString) -> FetchError {
        FetchError::Proxy {
            reason: format!("{}: {}", self.list_url, reason.to_string()),
        }
    }
}

/// Non-empty, trimmed lines of a downloaded list.
pub fn parse_proxy_list(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

impl ProxySource for HttpProxyList {
    fn fetch_proxies(&self) -> FetchResult<Vec<String>> {
        log::debug!("downloading proxy list from {}", self.list_url);

        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| self.http_error(e))?;

        let resp = client
            .get(&self.list_url)
            .send()
            .map_err(|e| self.http_error(e))?;
        if !resp.status().is_success() {
            return Err(self.http_error(format!("HTTP status {}", resp.status())));
        }
        let body = resp.text().map_err(|e| self.http_error(e))?;

        Ok(parse_proxy_list(&body))
    }
}

/// Client proxy for `route`, applied only to traffic of its scheme
/// (`http` or `https`); any other scheme proxies all traffic.
pub fn reqwest_proxy(route: &ProxyRoute) -> FetchResult<reqwest::Proxy> {
    let url = route.url();
    match route.scheme.as_str() {
        "http" => reqwest::Proxy::http(&url),
        "https" => reqwest::Proxy::https(&url),
        _ => reqwest::Proxy::all(&url),
    }
    .map_err(|e| FetchError::Proxy {
        reason: format!("{}: {}", url, e),
    })
}

/// A fixed list of endpoints, e.g. from `[proxy] endpoints`.
pub struct StaticProxyList {
    endpoints: Vec<String>,
}

impl StaticProxyList {
    pub fn new(endpoints: Vec<String>) -> Self {
        Self { endpoints }
    }
}

impl ProxySource for StaticProxyList {
    fn fetch_proxies(&self) -> FetchResult<Vec<String>> {
        Ok(self.endpoints.clone())
    }
}

/// Builds the proxy selector from `[proxy]`.
///
/// `endpoints` takes precedence over `list_url`. With `enabled = false` the
/// selector never routes through a proxy.
pub fn selector_from_config(config: &dyn ConfigPort) -> Result<ProxySelector, DashboardError> {
    if !config.get_bool("proxy", "enabled", true) {
        log::info!("proxy selection disabled");
        return Ok(ProxySelector::disabled());
    }

    let probability = config.get_double("proxy", "probability", DEFAULT_PROBABILITY);
    if !(0.0..=1.0).contains(&probability) {
        return Err(DashboardError::invalid(
            "proxy",
            "probability",
            "probability must be between 0 and 1",
        ));
    }

    let source: Box<dyn ProxySource> = match config.get_list("proxy", "endpoints") {
        Some(endpoints) if !endpoints.is_empty() => Box::new(StaticProxyList::new(endpoints)),
        _ => {
            let url = config
                .get_string("proxy", "list_url")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LIST_URL.to_string());
            let list = HttpProxyList::new(url.trim());
            let timeout = config.get_int("proxy", "timeout_secs", 0);
            if timeout > 0 {
                Box::new(list.with_timeout(Duration::from_secs(timeout as u64)))
            } else {
                Box::new(list)
            }
        }
    };

    let scheme = config
        .get_string("proxy", "scheme")
        .unwrap_or_else(|| DEFAULT_SCHEME.to_string());

    Ok(ProxySelector::new(source, probability).with_scheme(scheme.trim()))
}
