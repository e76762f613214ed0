//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod html_page_adapter;
pub mod html_table_adapter;
pub mod proxy_list_adapter;
pub mod yahoo_adapter;
#[cfg(feature = "web")]
pub mod web;
