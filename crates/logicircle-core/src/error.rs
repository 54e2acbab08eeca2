// ── Core error types ──
//
// Three failure families, one per component, plus an umbrella for the
// bridge lifecycle. Consumers never see HTTP status codes or JSON parse
// failures directly; the `From<logicircle_api::Error>` impls translate
// transport-layer errors into the family the call site belongs to.

use thiserror::Error;

/// Authentication against the camera cloud failed.
///
/// Operator-fixable: bad credentials or an unreachable identity endpoint.
/// Cloneable so a single failed re-authentication can be reported to every
/// caller that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("credentials rejected: {message}")]
    Rejected { message: String },

    #[error("authentication endpoint unreachable: {message}")]
    Unreachable { message: String },

    #[error("unexpected authentication response: {message}")]
    Protocol { message: String },
}

/// Listing the account's accessories failed.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("accessory listing failed: {message}")]
    Network { message: String },

    #[error("accessory listing was malformed: {message}")]
    Malformed { message: String },
}

impl DirectoryError {
    /// Whether a later attempt could succeed without operator action.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Auth(_))
    }
}

/// Retrieving one accessory's snapshot failed.
///
/// Scoped to a single entity; never affects siblings.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("session still rejected after re-authentication (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("could not resolve snapshot URL for {accessory_id}: {message}")]
    Resolve {
        accessory_id: String,
        message: String,
    },

    #[error("accessory {accessory_id} reports no image node")]
    NoNode { accessory_id: String },

    #[error("snapshot request for {accessory_id} failed: {message}")]
    Request {
        accessory_id: String,
        message: String,
    },

    #[error("snapshot for {accessory_id} was empty")]
    EmptyImage { accessory_id: String },

    #[error("snapshot for {accessory_id} is not an image (content type {content_type:?})")]
    NotAnImage {
        accessory_id: String,
        content_type: Option<String>,
    },
}

/// Unified error type for the bridge lifecycle.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Accessory not found: {identifier}")]
    AccessoryNotFound { identifier: String },

    #[error("Bridge is not running")]
    NotRunning,
}

impl From<logicircle_api::Error> for CoreError {
    fn from(err: logicircle_api::Error) -> Self {
        match err {
            logicircle_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            logicircle_api::Error::Tls(message) => CoreError::Config { message },
            other => CoreError::Auth(AuthError::from(other)),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<logicircle_api::Error> for AuthError {
    fn from(err: logicircle_api::Error) -> Self {
        match err {
            logicircle_api::Error::Authentication { message } => AuthError::Rejected { message },
            logicircle_api::Error::SessionExpired { status } => AuthError::Rejected {
                message: format!("session rejected (HTTP {status})"),
            },
            e @ (logicircle_api::Error::Transport(_)
            | logicircle_api::Error::Timeout { .. }
            | logicircle_api::Error::Tls(_)
            | logicircle_api::Error::InvalidUrl(_)) => AuthError::Unreachable {
                message: e.to_string(),
            },
            e @ (logicircle_api::Error::Api { .. }
            | logicircle_api::Error::Deserialization { .. }) => AuthError::Protocol {
                message: e.to_string(),
            },
        }
    }
}

impl From<logicircle_api::Error> for DirectoryError {
    fn from(err: logicircle_api::Error) -> Self {
        match err {
            logicircle_api::Error::Authentication { .. }
            | logicircle_api::Error::SessionExpired { .. } => {
                DirectoryError::Auth(AuthError::from(err))
            }
            logicircle_api::Error::Deserialization { message, .. } => {
                DirectoryError::Malformed { message }
            }
            other => DirectoryError::Network {
                message: other.to_string(),
            },
        }
    }
}
