// ── Runtime hub configuration ──
//
// These types describe which devices to poll and how to reach the API.
// They carry the bearer token but never touch disk: the CLI (via
// secsmart-config) constructs a `HubConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use secsmart_api::{TlsMode, TransportConfig};
use url::Url;

use crate::model::DeviceId;

/// Poll interval used when neither the device nor the domain overrides it.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Per-device settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub id: DeviceId,
    /// Overrides [`HubConfig::default_poll_interval`] for this device.
    pub poll_interval: Option<Duration>,
}

impl DeviceConfig {
    pub fn new(id: impl Into<DeviceId>) -> Self {
        Self {
            id: id.into(),
            poll_interval: None,
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// The interval this device actually polls at.
    pub fn effective_interval(&self, default: Duration) -> Duration {
        self.poll_interval.unwrap_or(default)
    }
}

/// Everything the hub needs to run.
///
/// Built by the config layer, passed to `Hub`. Core never reads config files.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// API root, e.g. `https://api.sec-smart.app/v1`.
    pub base_url: Url,
    pub token: SecretString,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Extra CA certificate (PEM) to trust, for proxies.
    pub ca_cert: Option<PathBuf>,
    /// Domain-level default poll interval.
    pub default_poll_interval: Duration,
    pub devices: Vec<DeviceConfig>,
}

impl HubConfig {
    pub fn new(base_url: Url, token: SecretString) -> Self {
        Self {
            base_url,
            token,
            timeout: secsmart_api::transport::DEFAULT_TIMEOUT,
            ca_cert: None,
            default_poll_interval: DEFAULT_POLL_INTERVAL,
            devices: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.devices.push(device);
        self
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.ca_cert.clone().map_or(TlsMode::System, TlsMode::CustomCa),
            timeout: self.timeout,
        }
    }
}
