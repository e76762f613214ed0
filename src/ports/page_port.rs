//! Page output port.

use crate::domain::error::DashboardError;
use crate::domain::page::Page;

/// Port for writing a rendered dashboard page.
pub trait PagePort {
    fn write(&self, page: &Page, output_path: &str) -> Result<(), DashboardError>;

    /// Renders the page to a string without touching the filesystem.
    fn render(&self, page: &Page) -> Result<String, DashboardError>;
}
