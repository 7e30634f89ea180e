//! `status`: polling health per device.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use tabled::Tabled;

use secsmart_core::{CoordinatorState, Health, Hub};

use crate::cli::{DeviceFilterArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct DeviceStatus {
    device: String,
    health: Health,
    areas: usize,
    last_success: Option<DateTime<Utc>>,
    last_attempt: Option<DateTime<Utc>>,
    error_kind: Option<String>,
    error: Option<String>,
}

impl DeviceStatus {
    fn new(device: String, state: &CoordinatorState) -> Self {
        Self {
            device,
            health: state.health(),
            areas: state.snapshot.as_ref().map_or(0, |s| s.areas.len()),
            last_success: state.last_success,
            last_attempt: state.last_attempt,
            error_kind: state.last_error.as_ref().map(|e| e.kind.to_string()),
            error: state.last_error.as_ref().map(|e| e.message.clone()),
        }
    }
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Health")]
    health: String,
    #[tabled(rename = "Areas")]
    areas: usize,
    #[tabled(rename = "Last Success")]
    last_success: String,
    #[tabled(rename = "Error")]
    error: String,
}

fn row(s: &DeviceStatus, color: bool) -> StatusRow {
    StatusRow {
        device: s.device.clone(),
        health: output::health_label(s.health, color),
        areas: s.areas,
        last_success: output::or_dash(s.last_success.map(|t| t.format("%Y-%m-%d %H:%M:%S"))),
        error: match (&s.error_kind, &s.error) {
            (Some(kind), Some(msg)) => format!("{kind}: {msg}"),
            _ => "-".into(),
        },
    }
}

pub async fn handle(
    hub: &Hub,
    args: DeviceFilterArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let coordinators = super::select(hub, args.device.as_deref())?;

    // Failures land in each coordinator's state; report them instead of bailing.
    join_all(coordinators.iter().map(|c| c.refresh())).await;

    let statuses: Vec<DeviceStatus> = coordinators
        .iter()
        .map(|c| DeviceStatus::new(c.device_id().to_string(), &c.state()))
        .collect();

    let color = output::should_color(global.color);
    let out = output::render_list(
        global.output,
        &statuses,
        |s| row(s, color),
        |s| format!("{} {}", s.device, output::health_label(s.health, false)),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
