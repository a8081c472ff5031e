//! IP reputation enrichment for Zentinel.
//!
//! Reads a list of IP addresses, looks each one up in AbuseIPDB and writes
//! the results to a CSV report.
//!
//! # Features
//!
//! - **Input normalization** - Validates IPv4/IPv6, deduplicates on the
//!   canonical address, caps the run at a record limit
//! - **AbuseIPDB lookups** - One sequential request per IP with a fixed
//!   pause between calls
//! - **Rate limit handling** - Honors `Retry-After` and retries once
//! - **Severity buckets** - `high` (>= 85), `medium` (>= 50), `low`,
//!   `unknown`, and `failed` for lookups that did not complete
//! - **Atomic report** - The CSV is written to a temp file and renamed
//!
//! # Example Configuration
//!
//! ```yaml
//! abuseipdb:
//!   api_key: "${ABUSEIPDB_API_KEY}"
//!   max_age_days: 30
//!   delay_between_ms: 1000
//!
//! input:
//!   path: "ips.txt"
//!   max_records: 1000
//!
//! output:
//!   path: "enriched_ips.csv"
//! ```

pub mod config;
pub mod enricher;
pub mod loader;
pub mod providers;
pub mod report;
pub mod severity;

pub use config::Config;
pub use enricher::{Enricher, RunSummary};
pub use severity::{classify, Severity};
