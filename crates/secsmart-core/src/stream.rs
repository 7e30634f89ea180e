// ── Reactive coordinator state ──
//
// Subscription type for consuming one device's state changes.

use std::sync::Arc;

use tokio::sync::watch;

use crate::coordinator::CoordinatorState;

/// A subscription to a coordinator's state.
///
/// Point-in-time access plus change notification via
/// [`changed()`](Self::changed).
pub struct StateStream {
    current: Arc<CoordinatorState>,
    receiver: watch::Receiver<Arc<CoordinatorState>>,
}

impl StateStream {
    pub(crate) fn new(mut receiver: watch::Receiver<Arc<CoordinatorState>>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// State as of the last observed change.
    pub fn current(&self) -> &Arc<CoordinatorState> {
        &self.current
    }

    /// Latest state (may have changed since the last observation).
    pub fn latest(&self) -> Arc<CoordinatorState> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change. `None` once the coordinator is dropped.
    pub async fn changed(&mut self) -> Option<Arc<CoordinatorState>> {
        self.receiver.changed().await.ok()?;
        let state = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&state);
        Some(state)
    }
}
