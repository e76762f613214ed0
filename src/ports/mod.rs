//! Port traits defining the boundaries between domain and adapters.

pub mod config_port;
pub mod quote_port;
pub mod table_port;
pub mod proxy_port;
pub mod page_port;
