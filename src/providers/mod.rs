//! IP reputation providers.

pub mod abuseipdb;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::net::IpAddr;

/// Reputation data returned for one IP.
///
/// Fields the provider did not return stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReputationData {
    /// Abuse confidence score (0-100, higher = worse).
    #[serde(
        rename = "abuseConfidenceScore",
        default,
        deserialize_with = "deserialize_score"
    )]
    pub score: Option<u8>,

    /// Total number of reports in the freshness window.
    #[serde(rename = "totalReports", default)]
    pub total_reports: Option<u32>,

    /// Timestamp of the most recent report.
    #[serde(rename = "lastReportedAt", default)]
    pub last_reported_at: Option<String>,

    /// Country code.
    #[serde(rename = "countryCode", default)]
    pub country_code: Option<String>,

    /// Usage type (e.g., "Data Center/Web Hosting/Transit").
    #[serde(rename = "usageType", default)]
    pub usage_type: Option<String>,

    /// ISP name.
    #[serde(default)]
    pub isp: Option<String>,

    /// Resolved domain.
    #[serde(default)]
    pub domain: Option<String>,
}

impl ReputationData {
    /// Data carrying only a score.
    pub fn with_score(score: u8) -> Self {
        Self {
            score: Some(score),
            ..Self::default()
        }
    }
}

/// Accept an integer or a numeric string in 0-100; anything else is no score.
fn deserialize_score<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let score = value
        .and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        })
        .and_then(|n| u8::try_from(n).ok())
        .filter(|n| *n <= 100);
    Ok(score)
}

/// Error from a reputation provider.
#[derive(Debug)]
pub enum ProviderError {
    /// HTTP request failed.
    Http(reqwest::Error),
    /// Timeout.
    Timeout,
    /// Still rate limited after the allowed retries.
    RateLimited,
    /// Non-success status other than 429.
    Status { status: u16, detail: String },
    /// Invalid response.
    InvalidResponse(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Http(e) => write!(f, "HTTP error: {}", e),
            ProviderError::Timeout => write!(f, "Request timed out"),
            ProviderError::RateLimited => write!(f, "Rate limited"),
            ProviderError::Status { status, detail } => write!(f, "HTTP {}: {}", status, detail),
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProviderError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Http(e)
        }
    }
}

/// Capability to look up the reputation of one IP address.
///
/// Implementations handle their own errors: a failed lookup is `None`.
#[async_trait]
pub trait ReputationLookup: Send + Sync {
    /// Look up an IP address.
    async fn lookup(&self, ip: &IpAddr) -> Option<ReputationData>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}
