//! Severity buckets derived from abuse confidence scores.

use serde::Serialize;
use std::fmt;

/// Score at or above which an IP is considered high severity.
pub const HIGH_SCORE: u8 = 85;

/// Score at or above which an IP is considered medium severity.
pub const MEDIUM_SCORE: u8 = 50;

/// Severity of an IP in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
    /// Lookup succeeded but carried no usable score.
    Unknown,
    /// Lookup itself failed.
    Failed,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Unknown => "unknown",
            Severity::Failed => "failed",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an abuse confidence score.
pub fn classify(score: Option<u8>) -> Severity {
    match score {
        Some(s) if s >= HIGH_SCORE => Severity::High,
        Some(s) if s >= MEDIUM_SCORE => Severity::Medium,
        Some(_) => Severity::Low,
        None => Severity::Unknown,
    }
}
