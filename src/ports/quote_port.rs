//! Quote provider port.

use crate::domain::error::FetchResult;
use crate::domain::history::PriceHistory;
use crate::domain::info::SecurityInfo;
use crate::domain::ohlcv::Split;
use crate::domain::period::HistoryRequest;
use crate::domain::proxy::ProxyRoute;

/// Client for security metadata, price history and split events.
///
/// Every operation makes a single attempt; `proxy` routes the request
/// through an anonymizing endpoint when present.
pub trait QuotePort: Send + Sync {
    fn fetch_info(&self, ticker: &str, proxy: Option<&ProxyRoute>) -> FetchResult<SecurityInfo>;

    /// When `request.start` is set it takes precedence over `request.period`.
    fn fetch_history(
        &self,
        ticker: &str,
        request: &HistoryRequest,
        proxy: Option<&ProxyRoute>,
    ) -> FetchResult<PriceHistory>;

    fn fetch_splits(&self, ticker: &str, proxy: Option<&ProxyRoute>) -> FetchResult<Vec<Split>>;
}
