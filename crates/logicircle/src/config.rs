//! CLI-side config: the shared loader plus `GlobalOpts` overrides.

use std::path::PathBuf;
use std::time::Duration;

use logicircle_config::Config;
use logicircle_core::BridgeConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file in effect: `--config` / `LOGICIRCLE_CONFIG`, else the
/// platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(logicircle_config::config_path)
}

/// Load the config file and apply CLI flag overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = logicircle_config::load_config_from(&config_path(global))?;

    if let Some(ref username) = global.username {
        cfg.username = Some(username.clone());
    }
    if let Some(ref api_url) = global.api_url {
        cfg.api_url.clone_from(api_url);
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout_secs = timeout;
    }
    Ok(cfg)
}

/// Resolve a ready-to-use `BridgeConfig` (credentials included).
pub fn bridge_config(global: &GlobalOpts) -> Result<BridgeConfig, CliError> {
    let cfg = load(global)?;
    if cfg.username.as_deref().is_none_or(|u| u.trim().is_empty()) {
        return Err(CliError::NoConfig {
            path: config_path(global).display().to_string(),
        });
    }
    Ok(logicircle_config::to_bridge_config(&cfg)?)
}

/// Apply `watch`-only overrides on top of a resolved config.
pub fn with_watch_overrides(
    mut bridge: BridgeConfig,
    interval: Option<u64>,
    failure_threshold: Option<u32>,
) -> Result<BridgeConfig, CliError> {
    if let Some(secs) = interval {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "interval".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        bridge.refresh_interval = Duration::from_secs(secs);
    }
    if let Some(threshold) = failure_threshold {
        if threshold == 0 {
            return Err(CliError::Validation {
                field: "failure-threshold".into(),
                reason: "must be at least 1".into(),
            });
        }
        bridge.failure_threshold = threshold;
    }
    Ok(bridge)
}
