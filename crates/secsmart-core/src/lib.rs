// secsmart-core: Polling, caching and fan-state mapping between the SEC Smart
// API and a percentage/preset fan model.

pub mod command;
pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod hub;
pub mod mapping;
pub mod model;
pub mod stream;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{AreaCommand, CommandOutcome, DEFAULT_ON_PERCENTAGE};
pub use config::{DEFAULT_POLL_INTERVAL, DeviceConfig, HubConfig};
pub use coordinator::{Coordinator, CoordinatorState, Health, RefreshResult};
pub use dispatcher::Dispatcher;
pub use error::{CoreError, FailureKind, RefreshFailure};
pub use hub::Hub;
pub use mapping::{AreaState, ManualLevel, Mode, Preset, percentage_to_mode, preset_to_mode};
pub use model::{AreaId, AreaRecord, DeviceId, DeviceSnapshot};
pub use secsmart_api::client::DEFAULT_BASE_URL;
pub use stream::StateStream;
pub use view::{AreaEntity, DeviceInfo, EntityReconciler, MembershipEvent, exposed_entities};
