//! Report exports
//!
//! - CSV: one row per loaded location of the current view
//! - PDF: investment report for one location and a simulation run
//!
//! Both refuse to produce a file when there is nothing loaded to report.

pub mod csv;
pub mod pdf;

pub use csv::{CSV_HEADER, ReportRow, csv_file_name, csv_report, write_csv_report};
pub use pdf::{InvestmentReport, ReportTable};

use std::path::{Path, PathBuf};
use tracing::info;

use crate::Result;

pub(crate) const NO_DATA_MESSAGE: &str =
    "No data available to analyze. Please wait for data to load.";

/// Write `contents` to `dir/file_name`, creating `dir` when missing
pub(crate) fn write_report(dir: &Path, file_name: &str, contents: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, contents)?;
    info!("Wrote {} ({} bytes)", path.display(), contents.len());
    Ok(path)
}
