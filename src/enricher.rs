//! Enrichment run: load the input list, look up every IP, write the report.

use crate::config::Config;
use crate::loader::{load_ips, LoadedIps};
use crate::providers::abuseipdb::AbuseIPDBClient;
use crate::providers::ReputationLookup;
use crate::report::{write_report, ReportRow};
use anyhow::Context;
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::{info, warn};

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows written.
    pub total: usize,
    /// Rows with reputation data.
    pub succeeded: usize,
    /// Rows marked as failed.
    pub failed: usize,
    /// Input lines rejected as invalid.
    pub invalid: usize,
    /// Distinct IPs cut off by the record limit.
    pub dropped: usize,
    /// Where the report was written.
    pub output: PathBuf,
}

/// Sequential IP enricher.
pub struct Enricher<L> {
    lookup: L,
}

impl Enricher<AbuseIPDBClient> {
    /// Create an enricher backed by the AbuseIPDB API.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = AbuseIPDBClient::new(&config.abuseipdb)
            .context("failed to create AbuseIPDB client")?;
        Ok(Self::new(client))
    }
}

impl<L: ReputationLookup> Enricher<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    /// Look up each IP in order, one at a time.
    pub async fn enrich(&self, ips: &[IpAddr]) -> Vec<ReportRow> {
        let total = ips.len();
        let mut rows = Vec::with_capacity(total);

        for (idx, ip) in ips.iter().enumerate() {
            info!(
                progress = %format!("{}/{}", idx + 1, total),
                ip = %ip,
                provider = self.lookup.name(),
                "Querying"
            );

            let row = ReportRow::new(*ip, self.lookup.lookup(ip).await);

            if row.is_failed() {
                warn!(ip = %ip, "Lookup failed, recording placeholder row");
            } else {
                info!(ip = %ip, score = ?row.score, severity = %row.severity, "Lookup complete");
            }

            rows.push(row);
        }

        rows
    }

    /// Run the whole pipeline for a configuration.
    ///
    /// Only input and output I/O errors abort the run.
    pub async fn run(&self, config: &Config) -> anyhow::Result<RunSummary> {
        let input = &config.input;
        let loaded: LoadedIps = load_ips(&input.path, input.max_records)
            .with_context(|| format!("failed to read input {}", input.path.display()))?;

        let rows = self.enrich(&loaded.ips).await;

        let output = &config.output.path;
        write_report(&rows, output)
            .with_context(|| format!("failed to write report {}", output.display()))?;

        let failed = rows.iter().filter(|r| r.is_failed()).count();
        let summary = RunSummary {
            total: rows.len(),
            succeeded: rows.len() - failed,
            failed,
            invalid: loaded.invalid,
            dropped: loaded.dropped,
            output: output.clone(),
        };

        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            invalid = summary.invalid,
            dropped = summary.dropped,
            output = %summary.output.display(),
            "Done, report saved"
        );

        Ok(summary)
    }
}
