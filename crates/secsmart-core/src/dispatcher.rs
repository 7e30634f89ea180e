// ── Command dispatcher ──
//
// Fire-and-confirm writes: resolve the command to a mode string, write it,
// then force a refresh. There is no optimistic local update; the cached
// state only changes once the refresh reports what the server holds.

use tracing::{debug, info, warn};

use crate::command::{AreaCommand, CommandOutcome, Resolution};
use crate::coordinator::Coordinator;
use crate::error::CoreError;
use crate::mapping::AreaState;
use crate::model::AreaId;

/// Issues area commands for one device.
#[derive(Clone)]
pub struct Dispatcher {
    coordinator: Coordinator,
}

impl Dispatcher {
    pub fn new(coordinator: Coordinator) -> Self {
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Execute a command against one area.
    ///
    /// Write failures are returned to the caller. A failure of the follow-up
    /// refresh is not: it is already recorded in the coordinator's state.
    pub async fn execute(
        &self,
        area: AreaId,
        command: AreaCommand,
    ) -> Result<CommandOutcome, CoreError> {
        let current = self
            .coordinator
            .snapshot()
            .and_then(|s| s.area(area).and_then(|r| AreaState::from_mode(&r.mode).preset));

        match command.resolve(current) {
            Resolution::Ignore(reason) => {
                warn!(
                    device = %self.coordinator.device_id(),
                    area = area.get(),
                    %reason,
                    "command ignored"
                );
                Ok(CommandOutcome::Ignored { reason })
            }
            Resolution::Write(mode) => {
                self.write(area, &mode).await?;
                Ok(CommandOutcome::Applied { mode })
            }
        }
    }

    pub async fn set_percentage(
        &self,
        area: AreaId,
        percentage: i32,
    ) -> Result<CommandOutcome, CoreError> {
        self.execute(area, AreaCommand::SetPercentage(percentage)).await
    }

    pub async fn set_preset(
        &self,
        area: AreaId,
        preset: &str,
    ) -> Result<CommandOutcome, CoreError> {
        self.execute(area, AreaCommand::SetPreset(preset.to_owned())).await
    }

    pub async fn turn_on(
        &self,
        area: AreaId,
        percentage: Option<i32>,
        preset: Option<String>,
    ) -> Result<CommandOutcome, CoreError> {
        self.execute(area, AreaCommand::TurnOn { percentage, preset }).await
    }

    pub async fn turn_off(&self, area: AreaId) -> Result<CommandOutcome, CoreError> {
        self.execute(area, AreaCommand::TurnOff).await
    }

    pub async fn toggle_boost(
        &self,
        area: AreaId,
        restore_percentage: Option<i32>,
    ) -> Result<CommandOutcome, CoreError> {
        self.execute(area, AreaCommand::ToggleBoost { restore_percentage }).await
    }

    async fn write(&self, area: AreaId, mode: &str) -> Result<(), CoreError> {
        let device = self.coordinator.device_id();
        info!(device = %device, area = area.get(), mode, "setting area mode");

        self.coordinator
            .client()
            .set_area_mode(device.as_str(), area.get(), mode)
            .await?;

        if let Err(failure) = self.coordinator.refresh().await {
            debug!(device = %device, kind = %failure.kind, "refresh after write failed");
        }
        Ok(())
    }
}
