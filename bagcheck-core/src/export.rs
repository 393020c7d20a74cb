//! Findings export for `--report`.
//!
//! CSV is one row per finding; JSON is the whole run summary. Both are
//! written atomically so an interrupted run never leaves a truncated report.

use std::path::Path;

use crate::atomic::write_atomic;
use crate::error::{CoreError, CoreResult};
use crate::retry::RetryPolicy;
use crate::runner::RunSummary;

pub const CSV_HEADER: &str = "bag_id,path_or_asset_id,kind,severity,message";

/// Export format, chosen from the report path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl ReportFormat {
    /// JSON for a `.json` path (any case), CSV otherwise.
    pub fn for_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ReportFormat::Json,
            _ => ReportFormat::Csv,
        }
    }
}

/// Renders every finding of every bag as CSV, CRLF-terminated.
pub fn to_csv(summary: &RunSummary) -> CoreResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER.split(','))?;
    for report in summary.reports() {
        for finding in report.findings() {
            let severity = finding.severity.to_string();
            writer.write_record([
                report.bag_id(),
                finding.subject.as_str(),
                finding.kind.as_str(),
                severity.as_str(),
                finding.message.as_str(),
            ])?;
        }
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::OperationFailed(format!("CSV export: {}", e.error())))?;
    String::from_utf8(bytes)
        .map_err(|e| CoreError::OperationFailed(format!("CSV export: {e}")))
}

pub fn to_json(summary: &RunSummary) -> CoreResult<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Writes the report for `summary` to `path` in the format its name implies.
pub fn write_report(summary: &RunSummary, path: &Path, retry: &RetryPolicy) -> CoreResult<()> {
    let text = match ReportFormat::for_path(path) {
        ReportFormat::Csv => to_csv(summary)?,
        ReportFormat::Json => to_json(summary)?,
    };
    log::info!("Writing report to {}", path.display());
    write_atomic(path, text.as_bytes(), retry)
}
