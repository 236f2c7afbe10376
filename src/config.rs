//! Tierlock configuration.

use crate::policy::access::GatingPolicy;
use std::time::Duration;

/// Default interval between remote revalidations (5 minutes).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default window before expiry in which users are warned (7 days).
pub const DEFAULT_WARNING_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default maximum age of a cached license trusted offline (7 days).
pub const DEFAULT_STALENESS_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default timeout for a single license check request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Default length of a locally bootstrapped demo license.
pub const DEFAULT_DEMO_PERIOD: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Configuration for the license lifecycle manager.
///
/// Product-specific settings plus the timing knobs of the revalidation
/// loop. Construct with [`TierlockConfig::new`] and override fields as
/// needed.
#[derive(Debug, Clone)]
pub struct TierlockConfig {
    /// Application name, used in the User-Agent and log fields.
    pub app_name: &'static str,

    /// Base URL of the license authority (e.g. "https://licenses.example.com").
    /// `POST {endpoint}/license/check` is called on every revalidation.
    pub endpoint: String,

    /// Installation identifier sent with every check.
    /// Derived from the machine fingerprint when `None`.
    pub client_id: Option<String>,

    /// Namespace for the encrypted store under the platform data dir.
    /// Also mixed into the at-rest encryption key.
    pub store_namespace: &'static str,

    /// Ed25519 public key (hex, 64 characters) the authority signs responses with.
    /// When set, unsigned or badly signed responses are not trusted.
    /// SECURITY: This should be hard-coded in your application, not from environment.
    pub public_key_hex: Option<&'static str>,

    /// Interval of the polling timer.
    pub poll_interval: Duration,

    /// Licenses expiring within this window validate with a warning.
    pub warning_window: Duration,

    /// Cached licenses older than this (since last remote confirmation)
    /// are no longer trusted.
    pub staleness_window: Duration,

    /// Timeout for a single license check request.
    pub request_timeout: Duration,

    /// Length of a demo license started with `start_demo`.
    pub demo_period: Duration,

    /// Which module gating policy is authoritative.
    pub gating: GatingPolicy,
}

impl TierlockConfig {
    /// Create a configuration with default timings.
    pub fn new(app_name: &'static str, endpoint: impl Into<String>) -> Self {
        Self {
            app_name,
            endpoint: endpoint.into(),
            client_id: None,
            store_namespace: app_name,
            public_key_hex: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            warning_window: DEFAULT_WARNING_WINDOW,
            staleness_window: DEFAULT_STALENESS_WINDOW,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            demo_period: DEFAULT_DEMO_PERIOD,
            gating: GatingPolicy::default(),
        }
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), crate::TierlockError> {
        if self.app_name.is_empty() {
            return Err(crate::TierlockError::ConfigError(
                "app_name cannot be empty".to_string(),
            ));
        }
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(crate::TierlockError::ConfigError(format!(
                "endpoint must be an http(s) URL, got {:?}",
                self.endpoint
            )));
        }
        if self.store_namespace.is_empty() {
            return Err(crate::TierlockError::ConfigError(
                "store_namespace cannot be empty".to_string(),
            ));
        }
        if let Some(key) = self.public_key_hex {
            if key.len() != 64 {
                return Err(crate::TierlockError::ConfigError(format!(
                    "public_key_hex must be 64 hex characters, got {}",
                    key.len()
                )));
            }
        }
        if self.client_id.as_deref().is_some_and(str::is_empty) {
            return Err(crate::TierlockError::ConfigError(
                "client_id cannot be empty when set".to_string(),
            ));
        }
        if self.poll_interval.is_zero() || self.staleness_window.is_zero() {
            return Err(crate::TierlockError::ConfigError(
                "poll_interval and staleness_window must be non-zero".to_string(),
            ));
        }
        if self.request_timeout < Duration::from_secs(1) || self.request_timeout > Duration::from_secs(60) {
            return Err(crate::TierlockError::ConfigError(format!(
                "request_timeout must be between 1s and 60s, got {:?}",
                self.request_timeout
            )));
        }
        // A demo record is never re-confirmed remotely, so it must expire
        // before it would turn stale.
        if self.demo_period > self.staleness_window {
            return Err(crate::TierlockError::ConfigError(
                "demo_period cannot exceed staleness_window".to_string(),
            ));
        }
        Ok(())
    }
}
