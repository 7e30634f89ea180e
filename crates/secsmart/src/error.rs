//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use secsmart_config::ConfigError;
use secsmart_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(secsmart::auth_failed),
        help(
            "The API rejected the bearer token.\n\
             Pass a fresh one with --token, set SECSMART_TOKEN, or run: secsmart config set-token"
        )
    )]
    AuthFailed { message: String },

    #[error("No API token configured")]
    #[diagnostic(
        code(secsmart::no_token),
        help(
            "Set SECSMART_TOKEN, pass --token, or run: secsmart config set-token\n\
             Config file: {path}"
        )
    )]
    NoToken { path: String },

    // ── Remote ───────────────────────────────────────────────────────
    #[error("The API rejected the request: {body}")]
    #[diagnostic(code(secsmart::bad_request))]
    BadRequest { body: String },

    #[error("Could not reach the SEC Smart API: {message}")]
    #[diagnostic(
        code(secsmart::connection_failed),
        help("Check your network connection and --base-url, then try again.")
    )]
    ConnectionFailed { message: String },

    #[error("Request timed out: {message}")]
    #[diagnostic(
        code(secsmart::timeout),
        help("Raise `timeout` in the config file or try again later.")
    )]
    Timeout { message: String },

    #[error("Unexpected API response: {message}")]
    #[diagnostic(code(secsmart::unexpected))]
    Unexpected { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Device '{device_id}' is not configured")]
    #[diagnostic(
        code(secsmart::unknown_device),
        help("Add it under [[devices]] in the config file. Run: secsmart config show")
    )]
    UnknownDevice { device_id: String },

    #[error("Area {area} of device '{device_id}' is not active")]
    #[diagnostic(
        code(secsmart::area_not_found),
        help("Run: secsmart areas {device_id}")
    )]
    AreaNotFound { device_id: String, area: u8 },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(secsmart::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(secsmart::no_config),
        help("Create it with a `[[devices]]` entry, or omit --config to use the default location.")
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(secsmart::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(secsmart::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(secsmart::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. } | Self::NoToken { .. } => exit_code::AUTH,
            Self::UnknownDevice { .. } | Self::AreaNotFound { .. } | Self::NoConfig { .. } => {
                exit_code::NOT_FOUND
            }
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::Config(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Authentication { message } => CliError::AuthFailed { message },
            CoreError::BadRequest { body } => CliError::BadRequest { body },
            CoreError::Transient { message } => CliError::ConnectionFailed { message },
            CoreError::Timeout { timeout } => CliError::Timeout {
                message: format!("no response within {timeout:?}"),
            },
            CoreError::Unexpected { message } => CliError::Unexpected { message },
            CoreError::UnknownDevice { device_id } => CliError::UnknownDevice { device_id },
            CoreError::InvalidArea { area } => CliError::Validation {
                field: "area".into(),
                reason: format!("{area} is not between 1 and 6"),
            },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoToken => CliError::NoToken {
                path: secsmart_config::config_path().display().to_string(),
            },
            ConfigError::Missing { path } => CliError::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}
