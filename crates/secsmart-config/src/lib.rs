//! Configuration for secsmart tools.
//!
//! TOML file + `SECSMART_` environment layering, bearer-token resolution
//! (env + keyring + plaintext), and translation to
//! `secsmart_core::HubConfig`. Core never reads files; this crate does.

use std::collections::HashSet;
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

use secsmart_core::{DeviceConfig, DeviceId, HubConfig};

/// Environment variable consulted for the token when `token_env` is unset
/// or empty.
pub const TOKEN_ENV: &str = "SECSMART_TOKEN";

const KEYRING_SERVICE: &str = "secsmart";
const KEYRING_USER: &str = "token";
const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API token found (set {TOKEN_ENV}, use the keyring, or add `token` to the file)")]
    NoToken,

    #[error("config file not found: {}", path.display())]
    Missing { path: PathBuf },

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

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// API root.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Default poll interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Bearer token (plaintext; prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Name of an environment variable holding the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Extra CA certificate (PEM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval: default_poll_interval(),
            timeout: default_timeout(),
            token: None,
            token_env: None,
            ca_cert: None,
            devices: Vec::new(),
        }
    }
}

/// One `[[devices]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceEntry {
    pub id: String,

    /// Poll interval override in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<u64>,
}

fn default_base_url() -> String {
    secsmart_core::DEFAULT_BASE_URL.into()
}
fn default_poll_interval() -> u64 {
    secsmart_core::DEFAULT_POLL_INTERVAL.as_secs()
}
fn default_timeout() -> u64 {
    20
}

impl Config {
    /// Copy with the plaintext token masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            token: self.token.as_ref().map(|_| REDACTED.to_owned()),
            ..self.clone()
        }
    }

    /// Check everything that can be checked without the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.base_url).map_err(|e| invalid("base_url", e.to_string()))?;

        if self.poll_interval == 0 {
            return Err(invalid("poll_interval", "must be at least 1 second"));
        }
        if self.timeout == 0 {
            return Err(invalid("timeout", "must be at least 1 second"));
        }
        if self.devices.is_empty() {
            return Err(invalid("devices", "at least one device is required"));
        }

        let mut seen = HashSet::new();
        for device in &self.devices {
            let id = device.id.trim();
            if id.is_empty() {
                return Err(invalid("devices.id", "must not be empty"));
            }
            if !seen.insert(id) {
                return Err(invalid("devices.id", format!("duplicate device id '{id}'")));
            }
            if device.poll_interval == Some(0) {
                return Err(invalid(
                    "devices.poll_interval",
                    format!("device '{id}': must be at least 1 second"),
                ));
            }
        }
        Ok(())
    }

    /// Build the core configuration. Validates first.
    pub fn to_hub_config(&self, token: SecretString) -> Result<HubConfig, ConfigError> {
        self.validate()?;

        let base_url =
            url::Url::parse(&self.base_url).map_err(|e| invalid("base_url", e.to_string()))?;
        let mut hub = HubConfig::new(base_url, token);
        hub.timeout = Duration::from_secs(self.timeout);
        hub.default_poll_interval = Duration::from_secs(self.poll_interval);
        hub.ca_cert.clone_from(&self.ca_cert);
        hub.devices = self
            .devices
            .iter()
            .map(|d| DeviceConfig {
                id: DeviceId::new(d.id.trim()),
                poll_interval: d.poll_interval.map(Duration::from_secs),
            })
            .collect();
        Ok(hub)
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("app", "sec-smart", "secsmart").map_or_else(
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
    p.push("secsmart");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from `path` (or the platform default) plus environment.
///
/// An explicit path must exist; the default path may be absent, in which
/// case only defaults and environment apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) if !p.exists() => {
            return Err(ConfigError::Missing {
                path: p.to_path_buf(),
            });
        }
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("SECSMART_").ignore(&["TOKEN", "CONFIG"]));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

/// Resolve the bearer token: `token_env` variable, then `SECSMART_TOKEN`,
/// then the system keyring, then plaintext `token`.
pub fn resolve_token(config: &Config) -> Result<SecretString, ConfigError> {
    resolve_token_with(config, |name| std::env::var(name).ok(), keyring_token)
}

/// Store a token in the system keyring.
pub fn store_token(token: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)
        .and_then(|entry| entry.set_password(token))
        .map_err(|e| invalid("keyring", e.to_string()))
}

fn keyring_token() -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)
        .ok()?
        .get_password()
        .ok()
}

fn resolve_token_with(
    config: &Config,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl FnOnce() -> Option<String>,
) -> Result<SecretString, ConfigError> {
    let non_empty = |v: String| (!v.trim().is_empty()).then_some(v);

    // 1. Configured env var
    if let Some(value) = config.token_env.as_deref().and_then(&env).and_then(non_empty) {
        return Ok(SecretString::from(value));
    }

    // 2. Well-known env var
    if let Some(value) = env(TOKEN_ENV).and_then(non_empty) {
        return Ok(SecretString::from(value));
    }

    // 3. System keyring
    if let Some(value) = keyring().and_then(non_empty) {
        return Ok(SecretString::from(value));
    }

    // 4. Plaintext in config
    config
        .token
        .clone()
        .and_then(non_empty)
        .map(SecretString::from)
        .ok_or(ConfigError::NoToken)
}
