// ── Runtime bridge configuration ──
//
// These types describe *how* to reach the camera cloud and how often to
// poll it. They carry credential data and tuning, but never touch disk.
// The CLI (or any other host) constructs a `BridgeConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::CoreError;

/// Account credentials. Held only by the session layer once handed in.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Retry schedule for accessory discovery at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl BackoffPolicy {
    /// Delay to sleep after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Configuration for one bridge instance (one cloud account).
///
/// Built by the CLI, passed to `Bridge` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Service root (e.g., `https://video.logi.com`).
    pub api_url: Url,
    pub credentials: Credentials,
    /// Display name used for accessories that report none.
    pub name: String,
    /// Custom CA certificate, if the system store is not enough.
    pub ca_cert: Option<PathBuf>,
    /// Bound on every network call.
    pub timeout: Duration,
    /// How often each entity refreshes its snapshot.
    pub refresh_interval: Duration,
    /// Consecutive failures before an entity turns unavailable.
    pub failure_threshold: u32,
    /// Startup discovery retries.
    pub discovery_backoff: BackoffPolicy,
}

impl BridgeConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            ..Self::default()
        }
    }

    /// Check the invariants the core relies on.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.credentials.username.trim().is_empty() {
            return Err(CoreError::Config {
                message: "username must not be empty".into(),
            });
        }
        if self.credentials.password.expose_secret().is_empty() {
            return Err(CoreError::Config {
                message: "password must not be empty".into(),
            });
        }
        if self.refresh_interval.is_zero() {
            return Err(CoreError::Config {
                message: "refresh interval must be at least one second".into(),
            });
        }
        if self.failure_threshold == 0 {
            return Err(CoreError::Config {
                message: "failure threshold must be at least 1".into(),
            });
        }
        if self.timeout.is_zero() {
            return Err(CoreError::Config {
                message: "timeout must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            api_url: logicircle_api::DEFAULT_API_URL
                .parse()
                .expect("default API URL is valid"),
            credentials: Credentials::new("", ""),
            name: "Logi Cam".into(),
            ca_cert: None,
            timeout: Duration::from_secs(10),
            refresh_interval: Duration::from_secs(60),
            failure_threshold: 3,
            discovery_backoff: BackoffPolicy::default(),
        }
    }
}
