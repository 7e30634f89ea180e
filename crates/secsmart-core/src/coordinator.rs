// ── Per-device polling coordinator ──
//
// Owns the cached snapshot of one device. Refreshes come from a periodic
// task or from explicit callers (e.g. after a write); concurrent callers
// share a single upstream request. A failed refresh never replaces the
// cached snapshot, it only records the failure next to it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared, WeakShared};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use secsmart_api::{AreasPayload, SecSmartClient};

use crate::error::{CoreError, RefreshFailure};
use crate::mapping::normalize_mode;
use crate::model::{AreaId, AreaRecord, DeviceId, DeviceSnapshot};
use crate::stream::StateStream;

/// Result handed to every caller of one coalesced refresh.
pub type RefreshResult = Result<Arc<DeviceSnapshot>, RefreshFailure>;

type RefreshFuture = BoxFuture<'static, RefreshResult>;

// ── CoordinatorState ─────────────────────────────────────────────

/// What a consumer can observe about one device.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoordinatorState {
    /// Last successfully fetched snapshot, kept across failures.
    pub snapshot: Option<Arc<DeviceSnapshot>>,
    /// Set by a failed refresh, cleared by the next success.
    pub last_error: Option<RefreshFailure>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
}

/// Coarse freshness of a [`CoordinatorState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    /// No refresh has completed yet.
    Pending,
    /// The last refresh succeeded.
    Fresh,
    /// The last refresh failed; an older snapshot is still served.
    Stale,
    /// Every refresh so far has failed.
    Unavailable,
}

impl CoordinatorState {
    pub fn health(&self) -> Health {
        match (&self.snapshot, &self.last_error) {
            (None, None) => Health::Pending,
            (Some(_), None) => Health::Fresh,
            (Some(_), Some(_)) => Health::Stale,
            (None, Some(_)) => Health::Unavailable,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.health() == Health::Stale
    }
}

// ── Coordinator ──────────────────────────────────────────────────

/// Polling and caching for a single device.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    device_id: DeviceId,
    client: Arc<SecSmartClient>,
    interval: Duration,
    state: watch::Sender<Arc<CoordinatorState>>,
    /// Refresh currently in flight. Locked only to read or swap the slot.
    /// Held weakly: once every caller has dropped it, the fetch is gone.
    in_flight: Mutex<Option<WeakShared<RefreshFuture>>>,
}

impl Coordinator {
    pub fn new(device_id: DeviceId, client: Arc<SecSmartClient>, interval: Duration) -> Self {
        let (state, _) = watch::channel(Arc::new(CoordinatorState::default()));
        Self {
            inner: Arc::new(CoordinatorInner {
                device_id,
                client,
                interval,
                state,
                in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.inner.device_id
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    pub fn client(&self) -> &Arc<SecSmartClient> {
        &self.inner.client
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Fetch the device's areas, or join the fetch already in flight.
    ///
    /// Every caller that overlaps one upstream request receives a clone of
    /// the same result. Failures are recorded in [`state()`](Self::state)
    /// and also returned, so callers may inspect them; they are never
    /// raised anywhere else.
    ///
    /// A refresh dropped by all of its callers is discarded without touching
    /// state; the next call starts a new request.
    pub async fn refresh(&self) -> RefreshResult {
        let pending = {
            let mut slot = lock(&self.inner.in_flight);
            if let Some(pending) = slot.as_ref().and_then(WeakShared::upgrade) {
                trace!(device = %self.inner.device_id, "joining in-flight refresh");
                pending
            } else {
                let inner = Arc::clone(&self.inner);
                let pending: Shared<RefreshFuture> = async move {
                    let result = inner.fetch().await;
                    lock(&inner.in_flight).take();
                    result
                }
                .boxed()
                .shared();
                *slot = pending.downgrade();
                pending
            }
        };
        pending.await
    }

    // ── State observation ────────────────────────────────────────

    /// Current state (snapshot, last error, timestamps).
    pub fn state(&self) -> Arc<CoordinatorState> {
        self.inner.state.borrow().clone()
    }

    /// Last good snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<DeviceSnapshot>> {
        self.inner.state.borrow().snapshot.clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<CoordinatorState>> {
        self.inner.state.subscribe()
    }

    /// Subscribe with snapshot access and `Stream` conversion.
    pub fn stream(&self) -> StateStream {
        StateStream::new(self.subscribe())
    }

    // ── Background polling ───────────────────────────────────────

    /// Spawn the periodic refresh task. It stops when `cancel` fires,
    /// abandoning any refresh it is waiting on.
    pub fn spawn_polling(&self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(poll_task(self.clone(), cancel))
    }
}

impl CoordinatorInner {
    async fn fetch(&self) -> RefreshResult {
        let attempt = Utc::now();
        let outcome = match self.client.get_areas(self.device_id.as_str()).await {
            Ok(payload) => normalize_areas(&payload, attempt),
            Err(e) => Err(CoreError::from(e)),
        };

        match outcome {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                debug!(
                    device = %self.device_id,
                    areas = snapshot.areas.len(),
                    "refresh complete"
                );
                self.state.send_modify(|state| {
                    *state = Arc::new(CoordinatorState {
                        snapshot: Some(Arc::clone(&snapshot)),
                        last_error: None,
                        last_attempt: Some(attempt),
                        last_success: Some(attempt),
                    });
                });
                Ok(snapshot)
            }
            Err(e) => {
                let failure = RefreshFailure::from_error(&e);
                warn!(
                    device = %self.device_id,
                    kind = %failure.kind,
                    error = %e,
                    "refresh failed, keeping previous snapshot"
                );
                self.state.send_modify(|state| {
                    *state = Arc::new(CoordinatorState {
                        snapshot: state.snapshot.clone(),
                        last_error: Some(failure.clone()),
                        last_attempt: Some(attempt),
                        last_success: state.last_success,
                    });
                });
                Err(failure)
            }
        }
    }
}

// ── Normalization ────────────────────────────────────────────────

/// Turn a raw `GET /areas` payload into a snapshot.
///
/// Only `area1`..`area6` are read. Entries that are not objects, or are
/// empty objects, are skipped. A missing or non-string `mode` becomes the
/// empty string; every mode is trimmed.
pub fn normalize_areas(
    payload: &AreasPayload,
    captured_at: DateTime<Utc>,
) -> Result<DeviceSnapshot, CoreError> {
    let Some(object) = payload.as_object() else {
        let message = match payload {
            AreasPayload::Json(other) => {
                format!("expected an object of areas, got {}", json_kind(other))
            }
            AreasPayload::Text(text) => format!(
                "expected JSON, got text: {}",
                text.chars().take(120).collect::<String>()
            ),
        };
        return Err(CoreError::Unexpected { message });
    };

    // Keys other than area1..area6 are ignored.
    let areas = object
        .iter()
        .filter_map(|(key, entry)| {
            let id = AreaId::from_key(key)?;
            let entry = entry.as_object()?;
            if entry.is_empty() {
                return None;
            }
            let mode = entry.get("mode").and_then(Value::as_str).unwrap_or_default();
            let record = AreaRecord {
                mode: normalize_mode(mode).to_owned(),
                label: entry
                    .get("label")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
                timers: entry.get("timers").filter(|t| !t.is_null()).cloned(),
            };
            Some((id, record))
        })
        .collect();

    Ok(DeviceSnapshot { areas, captured_at })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Background task ──────────────────────────────────────────────

async fn poll_task(coordinator: Coordinator, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(coordinator.interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    // Failures are already recorded and logged by the coordinator.
                    _ = coordinator.refresh() => {}
                }
            }
        }
    }
    debug!(device = %coordinator.device_id(), "polling stopped");
}
