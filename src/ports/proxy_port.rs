//! Proxy list provider port.

use crate::domain::error::FetchResult;

/// Supplies a fresh list of `ip:port` proxy endpoints on every call.
pub trait ProxySource: Send + Sync {
    fn fetch_proxies(&self) -> FetchResult<Vec<String>>;
}
