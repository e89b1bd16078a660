//! Client and polling configuration.

use std::env;
use std::time::Duration;

use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

use crate::error::{AutofillerError, Result};
use crate::security::validate_api_key;

pub const DEFAULT_BASE_URL: &str = "https://api.autofiller.dev/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(300);

/// Connection settings for one client instance.
///
/// Immutable once the client is built; the client owns its copy.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    api_key: SecretString,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl ClientConfig {
    /// Create a config with default settings.
    ///
    /// Fails with a validation error if the API key is empty or cannot be
    /// sent in a header.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = validate_api_key(api_key.into())?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `AUTOFILLER_API_KEY` (required), `AUTOFILLER_BASE_URL`,
    /// `AUTOFILLER_TIMEOUT_SECS` and `AUTOFILLER_MAX_RETRIES`.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("AUTOFILLER_API_KEY")
            .ok_or_else(|| AutofillerError::validation("AUTOFILLER_API_KEY must be set"))?;

        let mut config = Self::new(api_key)?;

        if let Some(url) = lookup("AUTOFILLER_BASE_URL") {
            config = config.with_base_url(url);
        }
        if let Some(secs) = lookup("AUTOFILLER_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                AutofillerError::validation("AUTOFILLER_TIMEOUT_SECS must be a whole number")
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(retries) = lookup("AUTOFILLER_MAX_RETRIES") {
            let retries: u32 = retries.trim().parse().map_err(|_| {
                AutofillerError::validation("AUTOFILLER_MAX_RETRIES must be a whole number")
            })?;
            config = config.with_max_retries(retries);
        }

        Ok(config)
    }

    /// Set a custom base URL (self-hosted instances, proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how many times an idempotent request may be re-sent.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay between retries (multiplied by the attempt number).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }
}

/// Settings for waiting on an async job.
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Delay between status checks. Default: 2s.
    pub poll_interval: Duration,

    /// Overall budget, measured from the first poll. Default: 300s.
    pub max_wait: Duration,

    /// Stops the wait early when cancelled.
    pub cancel: Option<CancellationToken>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
            cancel: None,
        }
    }
}

impl WaitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}
