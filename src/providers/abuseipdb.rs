//! AbuseIPDB reputation provider.

use super::{ProviderError, ReputationData, ReputationLookup};
use crate::config::AbuseIPDBConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

/// Retries allowed after a 429 for the same IP.
pub const MAX_RATE_LIMIT_RETRIES: u32 = 1;

/// Characters of an error body kept in logs.
const BODY_EXCERPT_CHARS: usize = 200;

/// AbuseIPDB check response.
#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    data: Option<ReputationData>,
}

/// AbuseIPDB error response.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    detail: String,
}

/// Raw reply to one check request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReply {
    pub status: u16,
    /// Raw `Retry-After` header value, if any.
    pub retry_after: Option<String>,
    pub body: String,
}

/// Sends a single check request.
#[async_trait]
pub trait CheckTransport: Send + Sync {
    async fn get_check(&self, ip: &IpAddr) -> Result<CheckReply, ProviderError>;
}

/// HTTP transport against the AbuseIPDB API.
pub struct ReqwestTransport {
    client: Client,
    endpoint: String,
    api_key: String,
    max_age_days: u32,
}

impl ReqwestTransport {
    /// Create a transport from provider configuration.
    pub fn new(config: &AbuseIPDBConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(concat!("zentinel-ip-enrich/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ProviderError::Http)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            max_age_days: config.max_age_days,
        })
    }
}

#[async_trait]
impl CheckTransport for ReqwestTransport {
    async fn get_check(&self, ip: &IpAddr) -> Result<CheckReply, ProviderError> {
        debug!(ip = %ip, "Querying AbuseIPDB");

        let response = self
            .client
            .get(&self.endpoint)
            .header("Key", &self.api_key)
            .header("Accept", "application/json")
            .query(&[
                ("ipAddress", ip.to_string()),
                ("maxAgeInDays", self.max_age_days.to_string()),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let body = response.text().await?;

        Ok(CheckReply {
            status,
            retry_after,
            body,
        })
    }
}

/// AbuseIPDB lookup client.
///
/// Handles rate limiting with a single bounded retry and pauses after
/// every lookup.
pub struct AbuseIPDBClient<T = ReqwestTransport> {
    transport: T,
    delay_between: Duration,
    default_retry_after: Duration,
    max_retry_after: Option<Duration>,
}

impl AbuseIPDBClient<ReqwestTransport> {
    /// Create a client talking HTTP to the configured endpoint.
    pub fn new(config: &AbuseIPDBConfig) -> Result<Self, ProviderError> {
        Ok(Self::with_transport(ReqwestTransport::new(config)?, config))
    }
}

impl<T: CheckTransport> AbuseIPDBClient<T> {
    /// Create a client over an arbitrary transport.
    pub fn with_transport(transport: T, config: &AbuseIPDBConfig) -> Self {
        Self {
            transport,
            delay_between: Duration::from_millis(config.delay_between_ms),
            default_retry_after: Duration::from_secs(config.default_retry_after_seconds),
            max_retry_after: config.max_retry_after_seconds.map(Duration::from_secs),
        }
    }

    /// Check one IP, surfacing the failure reason.
    pub async fn check(&self, ip: &IpAddr) -> Result<ReputationData, ProviderError> {
        for attempt in 0..=MAX_RATE_LIMIT_RETRIES {
            let reply = self.transport.get_check(ip).await?;

            match reply.status {
                200 => {
                    let data = parse_check_body(&reply.body)?;
                    debug!(
                        ip = %ip,
                        score = ?data.score,
                        reports = ?data.total_reports,
                        "AbuseIPDB lookup complete"
                    );
                    return Ok(data);
                }
                429 => {
                    if attempt == MAX_RATE_LIMIT_RETRIES {
                        break;
                    }
                    let wait = self.retry_wait(reply.retry_after.as_deref());
                    warn!(
                        ip = %ip,
                        wait_secs = wait.as_secs(),
                        "AbuseIPDB rate limit exceeded, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                }
                status => {
                    return Err(ProviderError::Status {
                        status,
                        detail: error_detail(&reply.body),
                    });
                }
            }
        }

        Err(ProviderError::RateLimited)
    }

    /// Wait before retrying a rate-limited request.
    fn retry_wait(&self, retry_after: Option<&str>) -> Duration {
        let wait = retry_after
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(self.default_retry_after);

        match self.max_retry_after {
            Some(max) => wait.min(max),
            None => wait,
        }
    }
}

#[async_trait]
impl<T: CheckTransport> ReputationLookup for AbuseIPDBClient<T> {
    async fn lookup(&self, ip: &IpAddr) -> Option<ReputationData> {
        let result = match self.check(ip).await {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(ip = %ip, error = %e, "AbuseIPDB lookup failed");
                None
            }
        };

        // Applied regardless of outcome.
        if !self.delay_between.is_zero() {
            tokio::time::sleep(self.delay_between).await;
        }

        result
    }

    fn name(&self) -> &str {
        "abuseipdb"
    }
}

/// Parse a successful check body.
fn parse_check_body(body: &str) -> Result<ReputationData, ProviderError> {
    let trimmed = body.trim_start_matches('\u{feff}');
    let response: CheckResponse = serde_json::from_str(trimmed).map_err(|e| {
        ProviderError::InvalidResponse(format!(
            "Failed to parse response: {} (body: {})",
            e,
            excerpt(trimmed)
        ))
    })?;

    response
        .data
        .ok_or_else(|| ProviderError::InvalidResponse("response has no data object".to_string()))
}

/// Best human-readable description of an error body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.errors.into_iter().next())
        .map(|e| excerpt(&e.detail))
        .unwrap_or_else(|| excerpt(body))
}

fn excerpt(body: &str) -> String {
    body.trim().chars().take(BODY_EXCERPT_CHARS).collect()
}
