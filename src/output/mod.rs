//! Output module for reports and exports
//!
//! This module handles:
//! - Exporting collected listings to CSV
//! - Printing the checkpoint status report
//! - Summarizing collected listings

mod csv_export;
pub mod stats;

pub use csv_export::{export_csv, write_csv, CSV_HEADERS};
pub use stats::{parse_compensation, print_status, print_summary, summarize, ListingSummary};

use crate::storage::Sink;
use crate::HarvestError;
use std::path::Path;

/// Exports every listing in the sink to `path`
///
/// # Returns
///
/// * `Ok(usize)` - Number of listings written
/// * `Err(HarvestError)` - Failed to read the sink or write the file
pub fn export_sink(sink: &dyn Sink, path: &Path) -> Result<usize, HarvestError> {
    let items = sink.all_items()?;
    export_csv(&items, path)
}
