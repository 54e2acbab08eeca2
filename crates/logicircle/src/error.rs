//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use logicircle_config::ConfigError;
use logicircle_core::{AuthError, CoreError, DirectoryError, FetchError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the camera cloud")]
    #[diagnostic(
        code(logicircle::connection_failed),
        help("Check network access to the service.\nDetail: {message}")
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(logicircle::auth_failed),
        help(
            "Verify the account email and password.\n\
             Run: logicircle config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No password configured for '{username}'")]
    #[diagnostic(
        code(logicircle::no_credentials),
        help(
            "Store one with: logicircle config set-password\n\
             Or set the LOGICIRCLE_PASSWORD environment variable."
        )
    )]
    NoCredentials { username: String },

    // ── Cameras ──────────────────────────────────────────────────────

    #[error("Camera '{identifier}' not found")]
    #[diagnostic(
        code(logicircle::not_found),
        help("Run: logicircle cameras to see available cameras")
    )]
    NotFound { identifier: String },

    #[error("Snapshot failed: {message}")]
    #[diagnostic(code(logicircle::snapshot_failed))]
    SnapshotFailed { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(logicircle::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("No account configured")]
    #[diagnostic(
        code(logicircle::no_config),
        help(
            "Set `username` in the config file, pass --username, or set LOGICIRCLE_USERNAME.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(logicircle::config))]
    Config(ConfigError),

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NoConfig { .. } | Self::Config(_) => exit_code::USAGE,
            Self::SnapshotFailed { .. } | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── Config / core → CliError mapping ─────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { username } => CliError::NoCredentials { username },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

impl From<AuthError> for CliError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Rejected { message } | AuthError::Protocol { message } => {
                CliError::AuthFailed { message }
            }
            AuthError::Unreachable { message } => CliError::ConnectionFailed { message },
        }
    }
}

impl From<DirectoryError> for CliError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Auth(e) => e.into(),
            DirectoryError::Network { message } => CliError::ConnectionFailed { message },
            DirectoryError::Malformed { message } => CliError::SnapshotFailed { message },
        }
    }
}

impl From<FetchError> for CliError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Auth(e) => e.into(),
            FetchError::Unauthorized { status } => CliError::AuthFailed {
                message: format!("session rejected after re-authentication (HTTP {status})"),
            },
            other => CliError::SnapshotFailed {
                message: other.to_string(),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Auth(e) => e.into(),
            CoreError::Directory(e) => e.into(),
            CoreError::Fetch(e) => e.into(),
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::AccessoryNotFound { identifier } => CliError::NotFound { identifier },
            CoreError::NotRunning => CliError::SnapshotFailed {
                message: "bridge is not running".into(),
            },
        }
    }
}
