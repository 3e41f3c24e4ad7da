//! First-party analytics: click tracking, web vitals and error reports.

mod buffer;
mod clicks;
mod reports;
mod store;
mod vitals;

pub use buffer::{BufferError, ClickBuffer};
pub use clicks::{ClickError, ClickEvent, Position, truncate_chars};
pub use reports::{
    ErrorReport, ErrorReporter, ReportCategory, ReportError, ReportSeverity, generate_error_id,
};
pub use store::{ClickStore, ClickSummary, ElementCount, HeatmapPoint, PageCount};
pub use vitals::WebVital;
