//! Input list loading.
//!
//! Reads one IP address per line, keeps the first occurrence of each
//! address and caps the list at the configured record count.

use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;
use tracing::{debug, info, warn};

/// IP addresses accepted from an input list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedIps {
    /// Distinct addresses, in first-seen order.
    pub ips: Vec<IpAddr>,
    /// Lines that did not parse as an IP address.
    pub invalid: usize,
    /// Repeated occurrences of an already accepted address.
    pub duplicates: usize,
    /// Distinct addresses cut off by the record limit.
    pub dropped: usize,
}

/// Load IP addresses from a newline-delimited file.
///
/// Fails only if the file cannot be read.
pub fn load_ips(path: &Path, max_records: usize) -> std::io::Result<LoadedIps> {
    let content = std::fs::read_to_string(path)?;
    let loaded = parse_ips(&content, max_records);

    info!(
        path = %path.display(),
        accepted = loaded.ips.len(),
        invalid = loaded.invalid,
        duplicates = loaded.duplicates,
        dropped = loaded.dropped,
        "Input list loaded"
    );

    Ok(loaded)
}

/// Parse IP addresses from newline-delimited text.
pub fn parse_ips(content: &str, max_records: usize) -> LoadedIps {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut loaded = LoadedIps::default();
    let mut seen = HashSet::new();

    for (lineno, line) in content.lines().enumerate() {
        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }

        let ip: IpAddr = match raw.parse() {
            Ok(ip) => ip,
            Err(_) => {
                warn!(line = lineno + 1, value = raw, "Skipping invalid IP");
                loaded.invalid += 1;
                continue;
            }
        };

        if seen.insert(ip) {
            loaded.ips.push(ip);
        } else {
            debug!(ip = %ip, "Skipping duplicate IP");
            loaded.duplicates += 1;
        }
    }

    if loaded.ips.len() > max_records {
        loaded.dropped = loaded.ips.len() - max_records;
        warn!(
            total = loaded.ips.len(),
            limit = max_records,
            dropped = loaded.dropped,
            "Input exceeds record limit, keeping the first entries"
        );
        loaded.ips.truncate(max_records);
    }

    loaded
}
