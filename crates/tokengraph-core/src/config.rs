//! Runtime configuration from `TOKENGRAPH_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::data_source::HttpDataSourceConfig;
use crate::graph::EdgeMode;
use crate::retry::{BackoffKind, RetryPolicy};
use crate::scheduler::SchedulePolicy;
use crate::{CoreError, SampleInterval, ValidationError};

pub const ENV_TOKEN_COUNT: &str = "TOKENGRAPH_TOKEN_COUNT";
pub const ENV_OHLCV_INTERVAL: &str = "TOKENGRAPH_OHLCV_INTERVAL";
pub const ENV_OHLCV_SAMPLES: &str = "TOKENGRAPH_OHLCV_SAMPLES";
pub const ENV_REFRESH_INTERVAL_SECS: &str = "TOKENGRAPH_REFRESH_INTERVAL_SECS";
pub const ENV_OUTPUT_PATH: &str = "TOKENGRAPH_OUTPUT_PATH";
pub const ENV_API_KEY_FILE: &str = "TOKENGRAPH_API_KEY_FILE";
pub const ENV_API_BASE_URL: &str = "TOKENGRAPH_API_BASE_URL";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "TOKENGRAPH_REQUEST_TIMEOUT_MS";
pub const ENV_REQUESTS_PER_MINUTE: &str = "TOKENGRAPH_REQUESTS_PER_MINUTE";
pub const ENV_FETCH_CONCURRENCY: &str = "TOKENGRAPH_FETCH_CONCURRENCY";
pub const ENV_EDGE_MODE: &str = "TOKENGRAPH_EDGE_MODE";
pub const ENV_MAX_CONSECUTIVE_FAILURES: &str = "TOKENGRAPH_MAX_CONSECUTIVE_FAILURES";
pub const ENV_RETRY_BACKOFF: &str = "TOKENGRAPH_RETRY_BACKOFF";

/// Validated settings for one deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphConfig {
    pub token_count: usize,
    pub interval: SampleInterval,
    pub samples: usize,
    pub refresh_interval: Duration,
    pub output_path: PathBuf,
    pub api_key_file: PathBuf,
    pub source: HttpDataSourceConfig,
    pub fetch_concurrency: usize,
    pub edge_mode: EdgeMode,
    pub max_consecutive_failures: Option<u32>,
    pub retry_backoff: BackoffKind,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            token_count: 100,
            interval: SampleInterval::default(),
            samples: 1000,
            refresh_interval: Duration::from_secs(86_400),
            output_path: PathBuf::from("graph.json"),
            api_key_file: PathBuf::from(".key"),
            source: HttpDataSourceConfig::default(),
            fetch_concurrency: 1,
            edge_mode: EdgeMode::default(),
            max_consecutive_failures: None,
            retry_backoff: BackoffKind::default(),
        }
    }
}

impl GraphConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable source; unset or blank variables
    /// keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(raw) = get(ENV_TOKEN_COUNT) {
            config.token_count = parse_positive(ENV_TOKEN_COUNT, &raw)?;
        }
        if let Some(raw) = get(ENV_OHLCV_INTERVAL) {
            config.interval = raw.parse()?;
        }
        if let Some(raw) = get(ENV_OHLCV_SAMPLES) {
            config.samples = parse_positive(ENV_OHLCV_SAMPLES, &raw)?;
        }
        if let Some(raw) = get(ENV_REFRESH_INTERVAL_SECS) {
            config.refresh_interval =
                Duration::from_secs(parse_positive(ENV_REFRESH_INTERVAL_SECS, &raw)?);
        }
        if let Some(raw) = get(ENV_OUTPUT_PATH) {
            config.output_path = PathBuf::from(raw);
        }
        if let Some(raw) = get(ENV_API_KEY_FILE) {
            config.api_key_file = PathBuf::from(raw);
        }
        if let Some(raw) = get(ENV_API_BASE_URL) {
            config.source.base_url = raw;
        }
        if let Some(raw) = get(ENV_REQUEST_TIMEOUT_MS) {
            config.source.timeout_ms = parse_positive(ENV_REQUEST_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = get(ENV_REQUESTS_PER_MINUTE) {
            config.source.requests_per_minute = parse_positive(ENV_REQUESTS_PER_MINUTE, &raw)?;
        }
        if let Some(raw) = get(ENV_FETCH_CONCURRENCY) {
            config.fetch_concurrency = parse_positive(ENV_FETCH_CONCURRENCY, &raw)?;
        }
        if let Some(raw) = get(ENV_EDGE_MODE) {
            config.edge_mode = raw.parse()?;
        }
        if let Some(raw) = get(ENV_MAX_CONSECUTIVE_FAILURES) {
            config.max_consecutive_failures =
                Some(parse_positive(ENV_MAX_CONSECUTIVE_FAILURES, &raw)?);
        }
        if let Some(raw) = get(ENV_RETRY_BACKOFF) {
            config.retry_backoff = raw.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Re-checks invariants after command-line overrides have been applied.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.token_count == 0 {
            return Err(ValidationError::ZeroTokenCount);
        }
        if self.samples == 0 {
            return Err(ValidationError::ZeroSampleCount);
        }
        if self.refresh_interval.is_zero() {
            return Err(ValidationError::ZeroSetting {
                name: ENV_REFRESH_INTERVAL_SECS,
            });
        }
        if self.fetch_concurrency == 0 {
            return Err(ValidationError::ZeroSetting {
                name: ENV_FETCH_CONCURRENCY,
            });
        }
        if self.source.requests_per_minute == 0 {
            return Err(ValidationError::ZeroSetting {
                name: ENV_REQUESTS_PER_MINUTE,
            });
        }
        let base_url = self.source.base_url.trim();
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(ValidationError::InvalidBaseUrl {
                value: self.source.base_url.clone(),
            });
        }
        Ok(())
    }

    pub fn schedule_policy(&self) -> SchedulePolicy {
        SchedulePolicy {
            interval: self.refresh_interval,
            retry: RetryPolicy {
                backoff: self.retry_backoff.backoff_for(self.refresh_interval),
                max_consecutive_failures: self.max_consecutive_failures,
            },
        }
    }
}

fn parse_positive<T>(name: &'static str, raw: &str) -> Result<T, ValidationError>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let value: T = raw.parse().map_err(|_| ValidationError::InvalidNumber {
        name,
        value: raw.to_owned(),
    })?;
    if value == T::default() {
        return Err(ValidationError::ZeroSetting { name });
    }
    Ok(value)
}

/// Reads the API key: the first line of `path`, surrounding whitespace removed.
///
/// # Errors
///
/// - [`CoreError::Io`] when the file cannot be read.
/// - [`ValidationError::EmptyApiKey`] when the first line is blank.
pub fn read_api_key(path: &Path) -> Result<String, CoreError> {
    let contents = std::fs::read_to_string(path)?;
    let key = contents.lines().next().unwrap_or_default().trim();
    if key.is_empty() {
        return Err(ValidationError::EmptyApiKey.into());
    }
    Ok(key.to_owned())
}
