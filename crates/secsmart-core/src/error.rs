// ── Core error types ──
//
// User-facing errors from secsmart-core. Consumers never see HTTP status
// codes or reqwest errors directly: the `From<secsmart_api::Error>` impl
// folds transport failures into the four-way refresh/write taxonomy.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote failures ──────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Request rejected by the API: {body}")]
    BadRequest { body: String },

    #[error("Temporary failure: {message}")]
    Transient { message: String },

    #[error("Request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Unexpected response: {message}")]
    Unexpected { message: String },

    // ── Local failures ───────────────────────────────────────────────
    #[error("Unknown device: {device_id}")]
    UnknownDevice { device_id: String },

    #[error("Invalid area {area}: must be between 1 and 6")]
    InvalidArea { area: u8 },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Taxonomy bucket, for failures that came from the remote side.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Authentication { .. } => FailureKind::Auth,
            Self::BadRequest { .. } => FailureKind::BadRequest,
            Self::Transient { .. } | Self::Timeout { .. } => FailureKind::Transient,
            _ => FailureKind::Unexpected,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<secsmart_api::Error> for CoreError {
    fn from(err: secsmart_api::Error) -> Self {
        use secsmart_api::Error as Api;

        match err {
            Api::Authentication { message } => CoreError::Authentication { message },
            Api::BadRequest { body } => CoreError::BadRequest { body },
            Api::Timeout { timeout } => CoreError::Timeout { timeout },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ref e if e.is_transient() => CoreError::Transient {
                message: e.to_string(),
            },
            other => CoreError::Unexpected {
                message: other.to_string(),
            },
        }
    }
}

// ── Refresh failure record ───────────────────────────────────────────

/// Classification of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Auth,
    BadRequest,
    Transient,
    Unexpected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auth => "auth",
            Self::BadRequest => "bad_request",
            Self::Transient => "transient",
            Self::Unexpected => "unexpected",
        })
    }
}

/// A refresh failure as recorded in coordinator state.
///
/// Cloneable so one coalesced result can be handed to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{kind} failure: {message}")]
pub struct RefreshFailure {
    pub kind: FailureKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl RefreshFailure {
    pub fn from_error(err: &CoreError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            at: Utc::now(),
        }
    }
}

impl From<RefreshFailure> for CoreError {
    fn from(failure: RefreshFailure) -> Self {
        match failure.kind {
            FailureKind::Auth => CoreError::Authentication {
                message: failure.message,
            },
            FailureKind::BadRequest => CoreError::BadRequest {
                body: failure.message,
            },
            FailureKind::Transient => CoreError::Transient {
                message: failure.message,
            },
            FailureKind::Unexpected => CoreError::Unexpected {
                message: failure.message,
            },
        }
    }
}
