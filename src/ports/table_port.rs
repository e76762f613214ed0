//! HTML table retrieval port.

use crate::domain::error::FetchResult;
use crate::domain::proxy::ProxyRoute;
use crate::domain::table::Table;

pub trait TablePort: Send + Sync {
    /// Retrieves `url` and parses the first `<table>` on the page.
    fn fetch_table(&self, url: &str, proxy: Option<&ProxyRoute>) -> FetchResult<Table>;
}
