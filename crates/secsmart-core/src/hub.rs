// ── Hub ──
//
// Explicit registry for one API account: a single shared client plus one
// coordinator per configured device. Built once and passed to whatever
// needs device access; there is no ambient lookup.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use secsmart_api::SecSmartClient;

use crate::config::HubConfig;
use crate::coordinator::Coordinator;
use crate::dispatcher::Dispatcher;
use crate::error::CoreError;
use crate::view::{AreaEntity, exposed_entities};

/// Entry point for consumers.
///
/// Cheaply cloneable via `Arc<HubInner>`. Does nothing on the network until
/// [`start()`](Self::start) or an explicit refresh.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

struct HubInner {
    coordinators: Vec<Coordinator>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Hub {
    /// Build the shared client and one coordinator per device.
    pub fn new(config: &HubConfig) -> Result<Self, CoreError> {
        let client = SecSmartClient::new(
            config.base_url.clone(),
            config.token.clone(),
            &config.transport(),
        )
        .map_err(|e| CoreError::Config {
            message: e.to_string(),
        })?;
        let client = Arc::new(client);
        let mut coordinators: Vec<Coordinator> = Vec::with_capacity(config.devices.len());

        for device in &config.devices {
            if coordinators.iter().any(|c| c.device_id() == &device.id) {
                warn!(device = %device.id, "duplicate device id ignored");
                continue;
            }
            coordinators.push(Coordinator::new(
                device.id.clone(),
                Arc::clone(&client),
                device.effective_interval(config.default_poll_interval),
            ));
        }

        Ok(Self {
            inner: Arc::new(HubInner {
                coordinators,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Refresh every device once, then start periodic polling.
    ///
    /// Initial refreshes run concurrently. A device whose first refresh
    /// fails is still polled; its failure is only recorded in its own
    /// coordinator.
    ///
    /// A hub that has been shut down stays stopped; calling this again
    /// only logs a warning.
    pub async fn start(&self) {
        let mut handles = self.inner.task_handles.lock().await;
        if self.inner.cancel.is_cancelled() {
            warn!("hub was shut down, not restarting");
            return;
        }
        if !handles.is_empty() {
            debug!("hub already started");
            return;
        }

        self.refresh_all().await;

        for coordinator in &self.inner.coordinators {
            handles.push(coordinator.spawn_polling(self.inner.cancel.child_token()));
        }
        info!(devices = self.inner.coordinators.len(), "hub started");
    }

    /// Refresh every device once without starting polling.
    ///
    /// Returns how many devices refreshed successfully.
    pub async fn refresh_all(&self) -> usize {
        let results = join_all(self.inner.coordinators.iter().map(Coordinator::refresh)).await;
        results.iter().filter(|r| r.is_ok()).count()
    }

    /// Stop polling and wait for the polling tasks to exit.
    ///
    /// Cached state is kept; coordinators stay usable for explicit
    /// refreshes.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "polling task ended abnormally");
            }
        }
        debug!("hub stopped");
    }

    // ── Device access ────────────────────────────────────────────

    /// Every coordinator, in configuration order.
    pub fn coordinators(&self) -> &[Coordinator] {
        &self.inner.coordinators
    }

    pub fn coordinator(&self, device_id: &str) -> Result<&Coordinator, CoreError> {
        self.inner
            .coordinators
            .iter()
            .find(|c| c.device_id().as_str() == device_id)
            .ok_or_else(|| CoreError::UnknownDevice {
                device_id: device_id.to_owned(),
            })
    }

    pub fn dispatcher(&self, device_id: &str) -> Result<Dispatcher, CoreError> {
        self.coordinator(device_id).map(|c| Dispatcher::new(c.clone()))
    }

    /// Entities exposed by the device's cached snapshot (empty before the
    /// first successful refresh).
    pub fn entities(&self, device_id: &str) -> Result<Vec<AreaEntity>, CoreError> {
        let coordinator = self.coordinator(device_id)?;
        Ok(coordinator
            .snapshot()
            .map(|snapshot| exposed_entities(coordinator.device_id(), &snapshot))
            .unwrap_or_default())
    }
}
