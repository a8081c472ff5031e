//! Configuration types for the IP enrichment run.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration for an enrichment run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// AbuseIPDB lookup configuration.
    pub abuseipdb: AbuseIPDBConfig,

    /// Input list configuration.
    #[serde(default)]
    pub input: InputConfig,

    /// Report output configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

/// AbuseIPDB lookup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AbuseIPDBConfig {
    /// API key (supports ${ENV_VAR} syntax).
    pub api_key: String,

    /// Check endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Only consider reports from the last N days.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,

    /// API request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Pause after every lookup, in milliseconds.
    #[serde(default = "default_delay_between")]
    pub delay_between_ms: u64,

    /// Wait used on 429 when the response carries no usable Retry-After.
    #[serde(default = "default_retry_after")]
    pub default_retry_after_seconds: u64,

    /// Optional upper bound on any single rate-limit wait.
    ///
    /// Unset means the provider's Retry-After is honored as given.
    #[serde(default)]
    pub max_retry_after_seconds: Option<u64>,
}

impl AbuseIPDBConfig {
    /// Build a config with defaults for everything but the key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: default_endpoint(),
            max_age_days: default_max_age_days(),
            timeout_ms: default_timeout(),
            delay_between_ms: default_delay_between(),
            default_retry_after_seconds: default_retry_after(),
            max_retry_after_seconds: None,
        }
    }
}

/// Default AbuseIPDB check endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.abuseipdb.com/api/v2/check";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_max_age_days() -> u32 {
    30
}

fn default_timeout() -> u64 {
    10_000
}

fn default_delay_between() -> u64 {
    1000
}

fn default_retry_after() -> u64 {
    2
}

/// Input list configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Newline-delimited list of IP addresses.
    #[serde(default = "default_input_path")]
    pub path: PathBuf,

    /// Maximum number of distinct IPs looked up per run.
    ///
    /// AbuseIPDB's free tier allows 1000 checks per day.
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            max_records: default_max_records(),
        }
    }
}

fn default_input_path() -> PathBuf {
    PathBuf::from("ips.txt")
}

fn default_max_records() -> usize {
    1000
}

/// Report output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// CSV report path.
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("enriched_ips.csv")
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// The result is not validated; callers apply overrides first and then
    /// call [`Config::validate`].
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let expanded = expand_env_vars(content)?;
        let config: Config = serde_yaml::from_str(&expanded)?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        let abuseipdb = &self.abuseipdb;

        if abuseipdb.api_key.trim().is_empty() {
            anyhow::bail!("abuseipdb.api_key is empty");
        }

        match reqwest::Url::parse(&abuseipdb.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => anyhow::bail!(
                "abuseipdb.endpoint must be http or https, got scheme '{}'",
                url.scheme()
            ),
            Err(e) => anyhow::bail!("abuseipdb.endpoint is not a valid URL: {}", e),
        }

        // AbuseIPDB rejects anything outside this window.
        if !(1..=365).contains(&abuseipdb.max_age_days) {
            anyhow::bail!(
                "abuseipdb.max_age_days ({}) must be between 1 and 365",
                abuseipdb.max_age_days
            );
        }

        if abuseipdb.timeout_ms == 0 {
            anyhow::bail!("abuseipdb.timeout_ms must be > 0");
        }

        if let Some(max) = abuseipdb.max_retry_after_seconds {
            if abuseipdb.default_retry_after_seconds > max {
                anyhow::bail!(
                    "default_retry_after_seconds ({}) must be <= max_retry_after_seconds ({})",
                    abuseipdb.default_retry_after_seconds,
                    max
                );
            }
        }

        if self.input.max_records == 0 {
            anyhow::bail!("input.max_records must be > 0");
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example() -> String {
        r#"# IP Enrichment Configuration

# AbuseIPDB check API
abuseipdb:
  api_key: "${ABUSEIPDB_API_KEY}"  # Use environment variable
  endpoint: "https://api.abuseipdb.com/api/v2/check"
  max_age_days: 30             # Only consider reports from last 30 days (1-365)
  timeout_ms: 10000            # Per-request timeout
  delay_between_ms: 1000       # Pause after every lookup
  default_retry_after_seconds: 2   # Wait on 429 without Retry-After
  # max_retry_after_seconds: 60    # Optional cap on any rate-limit wait

# Input list, one IPv4/IPv6 address per line
input:
  path: "ips.txt"
  max_records: 1000            # Extra distinct IPs are dropped

# CSV report
output:
  path: "enriched_ips.csv"
"#
        .to_string()
    }
}

/// Expand environment variables in the format ${VAR_NAME}.
fn expand_env_vars(content: &str) -> anyhow::Result<String> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}")?;
    let expanded = re.replace_all(content, |cap: &regex::Captures<'_>| {
        std::env::var(&cap[1]).unwrap_or_default()
    });
    Ok(expanded.into_owned())
}
