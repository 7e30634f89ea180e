//! `areas`: list the active areas of one or all devices.

use futures_util::future::join_all;
use tabled::Tabled;

use secsmart_core::{AreaEntity, CoreError, exposed_entities};

use crate::cli::{DeviceFilterArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct AreaRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Area")]
    area: u8,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Speed")]
    percentage: String,
    #[tabled(rename = "Preset")]
    preset: String,
    #[tabled(rename = "Timers")]
    timers: String,
}

impl From<&AreaEntity> for AreaRow {
    fn from(e: &AreaEntity) -> Self {
        Self {
            id: e.unique_id.clone(),
            device: e.device_id.to_string(),
            area: e.area_id.get(),
            name: e.name.clone(),
            mode: e.mode.clone(),
            percentage: e.percentage.map_or_else(|| "-".into(), |p| format!("{p}%")),
            preset: output::or_dash(e.preset),
            timers: e.timers.as_ref().map_or_else(|| "-".into(), ToString::to_string),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    hub: &secsmart_core::Hub,
    args: DeviceFilterArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let coordinators = super::select(hub, args.device.as_deref())?;

    let results = join_all(coordinators.iter().map(|c| c.refresh())).await;

    let mut entities = Vec::new();
    for (coordinator, result) in coordinators.iter().zip(results) {
        let snapshot = result.map_err(CoreError::from)?;
        entities.extend(exposed_entities(coordinator.device_id(), &snapshot));
    }

    let out = output::render_list(
        global.output,
        &entities,
        |e| AreaRow::from(e),
        |e| e.unique_id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
