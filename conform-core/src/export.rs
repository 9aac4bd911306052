//! Report export.
//!
//! Only CSV is produced. Spreadsheet and PDF output are advertised formats
//! that always fail with [`ReviewError::Export`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{info, warn};

use crate::error::{Result, ReviewError};
use crate::types::ConformanceResult;

/// Notice shown for any failed export.
pub const FAILURE_MESSAGE: &str = "Failed to export report. Please try again.";

const CSV_HEADER: [&str; 9] = [
    "Item ID",
    "Material Description",
    "Spec Section",
    "Division",
    "System Type",
    "Status",
    "Confidence",
    "Discrepancy Approved",
    "Approval Reason",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Csv, ExportFormat::Xlsx, ExportFormat::Pdf];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// `"Report exported as CSV successfully"`.
    pub fn success_message(self) -> String {
        format!("Report exported as {self} successfully")
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_uppercase())
    }
}

impl FromStr for ExportFormat {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportFormat::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ReviewError::validation(format!("unknown export format '{s}'")))
    }
}

/// Quotes a field when it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

pub fn render_csv(results: &[ConformanceResult]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');
    for r in results {
        let reason = r
            .discrepancy
            .as_ref()
            .filter(|d| d.approved)
            .and_then(|d| d.reason)
            .map(|reason| reason.label())
            .unwrap_or_default();
        let row = [
            csv_field(&r.id),
            csv_field(&r.material_description),
            csv_field(&r.spec_section),
            csv_field(&r.division),
            csv_field(&r.system_type),
            csv_field(r.overall_status.label()),
            r.confidence_score.to_string(),
            if r.is_discrepancy_approved() { "yes" } else { "no" }.to_owned(),
            csv_field(reason),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Writes the report for `run_id` into `dir` and returns the file path.
pub fn write_report(
    format: ExportFormat,
    run_id: &str,
    results: &[ConformanceResult],
    dir: &Path,
) -> Result<PathBuf> {
    let body = match format {
        ExportFormat::Csv => render_csv(results),
        ExportFormat::Xlsx | ExportFormat::Pdf => {
            warn!(%format, run_id, "export format not available");
            return Err(ReviewError::Export(format!("{format} export is not available")));
        }
    };
    let path = dir.join(format!("conformance-report-{run_id}.{}", format.extension()));
    std::fs::write(&path, body)
        .map_err(|e| ReviewError::Export(format!("{}: {e}", path.display())))?;
    info!(path = %path.display(), rows = results.len(), "report exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    #[test]
    fn csv_has_header_and_one_row_per_result() {
        let results = seed::demo_results();
        let csv = render_csv(&results);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), results.len() + 1);
        assert!(lines[0].starts_with("Item ID,Material Description"));
        // Descriptions with commas are quoted.
        assert!(lines[1].starts_with(
            "result-1,\"Centrifugal Chiller, Water-Cooled, 500 Ton Capacity, Variable Speed Drive\",23 64 16"
        ));
        assert!(lines[1].ends_with(",Pre-Approved,98,no,"));
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(csv_field("4\" Diameter, Type L"), "\"4\"\" Diameter, Type L\"");
        assert_eq!(csv_field("plain"), "plain");
    }

    #[test]
    fn csv_is_written_and_other_formats_fail() {
        let dir = tempfile::TempDir::new().unwrap();
        let results = seed::demo_results();
        let path = write_report(ExportFormat::Csv, "run-1", &results, dir.path()).unwrap();
        assert!(path.ends_with("conformance-report-run-1.csv"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("result-10"));

        for format in [ExportFormat::Xlsx, ExportFormat::Pdf] {
            let err = write_report(format, "run-1", &results, dir.path()).unwrap_err();
            assert!(matches!(err, ReviewError::Export(_)));
        }
        assert_eq!(ExportFormat::Csv.success_message(), "Report exported as CSV successfully");
        assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
    }
}
