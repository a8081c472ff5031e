//! CSV report rows and writer.

use crate::providers::ReputationData;
use crate::severity::{classify, Severity};
use anyhow::Context;
use serde::Serialize;
use std::io::Write;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Report columns, in order.
pub const REPORT_HEADER: [&str; 9] = [
    "IP",
    "AbuseScore",
    "Severity",
    "TotalReports",
    "LastReportedAt",
    "Country",
    "UsageType",
    "ISP",
    "Domain",
];

/// One line of the report.
///
/// Field order matches [`REPORT_HEADER`]. `None` serializes as an empty cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub ip: IpAddr,
    pub score: Option<u8>,
    pub severity: Severity,
    pub total_reports: Option<u32>,
    pub last_reported_at: Option<String>,
    pub country: Option<String>,
    pub usage_type: Option<String>,
    pub isp: Option<String>,
    pub domain: Option<String>,
}

impl ReportRow {
    /// Build the row for a lookup outcome.
    pub fn new(ip: IpAddr, data: Option<ReputationData>) -> Self {
        match data {
            Some(data) => Self::found(ip, data),
            None => Self::failed(ip),
        }
    }

    /// Row for a completed lookup.
    pub fn found(ip: IpAddr, data: ReputationData) -> Self {
        Self {
            ip,
            score: data.score,
            severity: classify(data.score),
            total_reports: data.total_reports,
            last_reported_at: data.last_reported_at,
            country: data.country_code,
            usage_type: data.usage_type,
            isp: data.isp,
            domain: data.domain,
        }
    }

    /// Placeholder row for a failed lookup.
    pub fn failed(ip: IpAddr) -> Self {
        Self {
            ip,
            score: None,
            severity: Severity::Failed,
            total_reports: None,
            last_reported_at: None,
            country: None,
            usage_type: None,
            isp: None,
            domain: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.severity == Severity::Failed
    }
}

/// Serialize rows as CSV, header first.
pub fn write_rows<W: Write>(rows: &[ReportRow], writer: W) -> anyhow::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    // Written explicitly so an empty run still gets a header.
    csv_writer
        .write_record(REPORT_HEADER)
        .context("CSV write error")?;

    for row in rows {
        csv_writer.serialize(row).context("CSV write error")?;
    }

    csv_writer.flush().context("CSV flush error")?;
    Ok(())
}

/// Write the report to `path`.
///
/// The CSV goes to a temporary file beside the target which is then renamed
/// into place, so `path` never holds a partial report.
pub fn write_report(rows: &[ReportRow], path: &Path) -> anyhow::Result<()> {
    let tmp_path = temp_path_for(path);

    let result = (|| -> anyhow::Result<()> {
        let file = std::fs::File::create(&tmp_path)
            .with_context(|| format!("cannot create {}", tmp_path.display()))?;
        let mut buffered = std::io::BufWriter::new(file);
        write_rows(rows, &mut buffered)?;
        let file = buffered
            .into_inner()
            .map_err(|e| e.into_error())
            .context("CSV flush error")?;
        file.sync_all()
            .with_context(|| format!("cannot sync {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path).with_context(|| {
            format!("failed to move report into place at {}", path.display())
        })
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }

    result
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "report.csv".into());
    name.push(".tmp");
    path.with_file_name(name)
}
