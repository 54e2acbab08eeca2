//! Configuration for the Logi Circle bridge.
//!
//! TOML file + `LOGICIRCLE_*` environment, credential resolution (env +
//! keyring + plaintext), and translation to `logicircle_core::BridgeConfig`.
//! The CLI layers its `GlobalOpts` overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use logicircle_core::{BridgeConfig, Credentials};

/// Keyring service name for stored passwords.
pub const KEYRING_SERVICE: &str = "logicircle";

/// Environment variable checked first for the account password.
pub const PASSWORD_ENV: &str = "LOGICIRCLE_PASSWORD";

const ENV_PREFIX: &str = "LOGICIRCLE_";
const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for '{username}'")]
    NoCredentials { username: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// On-disk configuration for one account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Account email.
    pub username: Option<String>,

    /// Password (plaintext -- prefer the keyring or `LOGICIRCLE_PASSWORD`).
    pub password: Option<String>,

    /// Display prefix for accessories without a name of their own.
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            name: default_name(),
            api_url: default_api_url(),
            ca_cert: None,
            timeout_secs: default_timeout(),
            refresh_interval_secs: default_refresh_interval(),
            failure_threshold: default_failure_threshold(),
        }
    }
}

fn default_name() -> String {
    "Logi Cam".into()
}
fn default_api_url() -> String {
    "https://video.logi.com".into()
}
fn default_timeout() -> u64 {
    10
}
fn default_refresh_interval() -> u64 {
    60
}
fn default_failure_threshold() -> u32 {
    3
}

impl Config {
    /// Copy with the plaintext password masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            password: self.password.as_ref().map(|_| REDACTED.into()),
            ..self.clone()
        }
    }

    /// Check field-level invariants. Credentials are checked separately,
    /// since the password may live outside the file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.as_deref().is_none_or(|u| u.trim().is_empty()) {
            return Err(ConfigError::Validation {
                field: "username".into(),
                reason: "must not be empty".into(),
            });
        }
        url::Url::parse(&self.api_url).map_err(|e| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL '{}': {e}", self.api_url),
        })?;
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::Validation {
                field: "refresh_interval_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.failure_threshold == 0 {
            return Err(ConfigError::Validation {
                field: "failure_threshold".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "timeout_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "logicircle", "logicircle").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("logicircle");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` + environment. A missing file is fine;
/// defaults and environment still apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(username: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{username}/password"),
    )?)
}

/// Resolve the account password: env var, then keyring, then plaintext.
pub fn resolve_password(cfg: &Config, username: &str) -> Result<SecretString, ConfigError> {
    let from_keyring = || {
        keyring_entry(username)
            .ok()
            .and_then(|entry| entry.get_password().ok())
    };
    resolve_password_with(cfg, username, std::env::var(PASSWORD_ENV).ok(), from_keyring)
}

fn resolve_password_with(
    cfg: &Config,
    username: &str,
    env: Option<String>,
    keyring: impl FnOnce() -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Env var
    if let Some(pw) = env.filter(|p| !p.is_empty()) {
        return Ok(SecretString::from(pw));
    }

    // 2. Keyring
    if let Some(pw) = keyring().filter(|p| !p.is_empty()) {
        return Ok(SecretString::from(pw));
    }

    // 3. Plaintext in config
    if let Some(pw) = cfg.password.as_ref().filter(|p| !p.is_empty()) {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        username: username.into(),
    })
}

/// Store the account password in the system keyring.
pub fn store_password(username: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(username)?.set_password(password)?;
    Ok(())
}

// ── Translation to core ─────────────────────────────────────────────

/// Build a `BridgeConfig`, resolving the password through the full chain.
pub fn to_bridge_config(cfg: &Config) -> Result<BridgeConfig, ConfigError> {
    cfg.validate()?;
    let username = cfg.username.clone().unwrap_or_default();
    let password = resolve_password(cfg, &username)?;
    build_bridge_config(cfg, username, password)
}

fn build_bridge_config(
    cfg: &Config,
    username: String,
    password: SecretString,
) -> Result<BridgeConfig, ConfigError> {
    let api_url = cfg
        .api_url
        .parse()
        .map_err(|e| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL '{}': {e}", cfg.api_url),
        })?;

    let mut bridge = BridgeConfig::new(Credentials { username, password });
    bridge.api_url = api_url;
    bridge.name.clone_from(&cfg.name);
    bridge.ca_cert.clone_from(&cfg.ca_cert);
    bridge.timeout = Duration::from_secs(cfg.timeout_secs);
    bridge.refresh_interval = Duration::from_secs(cfg.refresh_interval_secs);
    bridge.failure_threshold = cfg.failure_threshold;
    Ok(bridge)
}
