//! `run`: poll continuously and print changes until interrupted.

use std::collections::BTreeMap;

use futures_util::future::join_all;
use owo_colors::OwoColorize;
use serde::Serialize;

use secsmart_core::{
    AreaEntity, AreaId, Coordinator, CoordinatorState, EntityReconciler, Health, Hub,
    MembershipEvent, exposed_entities,
};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// One line of `run` output.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WatchLine<'a> {
    Membership(&'a MembershipEvent),
    Changed(AreaChange<'a>),
    Health(HealthChange<'a>),
}

#[derive(Debug, Serialize)]
struct AreaChange<'a> {
    event: &'static str,
    unique_id: &'a str,
    mode: &'a str,
    percentage: Option<u8>,
    preset: Option<secsmart_core::Preset>,
}

#[derive(Debug, Serialize)]
struct HealthChange<'a> {
    event: &'static str,
    device: &'a str,
    health: Health,
    error: Option<&'a str>,
}

struct Printer {
    format: OutputFormat,
    color: bool,
    quiet: bool,
}

impl Printer {
    fn emit(&self, line: &WatchLine<'_>) -> Result<(), CliError> {
        let text = match self.format {
            // One document per line so the stream stays parseable.
            OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(line)?,
            OutputFormat::Yaml => format!("---\n{}", serde_yaml::to_string(line)?.trim_end()),
            OutputFormat::Table | OutputFormat::Plain => self.text(line),
        };
        output::print_output(&text, self.quiet);
        Ok(())
    }

    fn text(&self, line: &WatchLine<'_>) -> String {
        match line {
            WatchLine::Membership(MembershipEvent::Added(e)) => {
                let tag = if self.color {
                    "+".green().to_string()
                } else {
                    "+".into()
                };
                format!("{tag} {} ({}): {}", e.unique_id, e.name, e.mode)
            }
            WatchLine::Membership(MembershipEvent::Removed { unique_id, .. }) => {
                let tag = if self.color {
                    "-".red().to_string()
                } else {
                    "-".into()
                };
                format!("{tag} {unique_id}")
            }
            WatchLine::Changed(c) => format!(
                "~ {}: {} ({})",
                c.unique_id,
                c.mode,
                c.percentage.map_or_else(|| output::or_dash(c.preset), |p| format!("{p}%"))
            ),
            WatchLine::Health(h) => format!(
                "! {}: {}{}",
                h.device,
                output::health_label(h.health, self.color),
                h.error.map(|e| format!(" ({e})")).unwrap_or_default()
            ),
        }
    }
}

pub async fn handle(hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    let printer = Printer {
        format: global.output,
        color: output::should_color(global.color),
        quiet: global.quiet,
    };

    hub.start().await;

    let watchers = hub.coordinators().iter().map(|c| watch(c, &printer));

    tokio::select! {
        results = join_all(watchers) => {
            results.into_iter().collect::<Result<Vec<()>, _>>()?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, stopping");
        }
    }

    hub.shutdown().await;
    Ok(())
}

/// Follow one coordinator until its state channel closes.
async fn watch(coordinator: &Coordinator, printer: &Printer) -> Result<(), CliError> {
    let device = coordinator.device_id().to_string();
    let mut reconciler = EntityReconciler::new(coordinator.device_id().clone());
    let mut modes: BTreeMap<AreaId, String> = BTreeMap::new();
    let mut health = Health::Pending;

    let mut stream = coordinator.stream();
    let mut state = stream.latest();

    loop {
        report_health(&device, &state, &mut health, printer)?;

        if let Some(snapshot) = state.snapshot.as_deref() {
            for event in reconciler.reconcile(snapshot) {
                if let MembershipEvent::Removed { area_id, .. } = &event {
                    modes.remove(area_id);
                }
                printer.emit(&WatchLine::Membership(&event))?;
            }

            for entity in exposed_entities(coordinator.device_id(), snapshot) {
                report_change(&entity, &mut modes, printer)?;
            }
        }

        match stream.changed().await {
            Some(next) => state = next,
            None => return Ok(()),
        }
    }
}

fn report_health(
    device: &str,
    state: &CoordinatorState,
    last: &mut Health,
    printer: &Printer,
) -> Result<(), CliError> {
    let health = state.health();
    if health == *last || (health == Health::Fresh && *last == Health::Pending) {
        *last = health;
        return Ok(());
    }
    *last = health;
    printer.emit(&WatchLine::Health(HealthChange {
        event: "health",
        device,
        health,
        error: state.last_error.as_ref().map(|e| e.message.as_str()),
    }))
}

/// Print an entity whose mode moved since the last snapshot.
fn report_change(
    entity: &AreaEntity,
    modes: &mut BTreeMap<AreaId, String>,
    printer: &Printer,
) -> Result<(), CliError> {
    let previous = modes.insert(entity.area_id, entity.mode.clone());
    match previous {
        // First sighting is covered by the `Added` event.
        None => Ok(()),
        Some(ref mode) if *mode == entity.mode => Ok(()),
        Some(_) => printer.emit(&WatchLine::Changed(AreaChange {
            event: "changed",
            unique_id: &entity.unique_id,
            mode: &entity.mode,
            percentage: entity.percentage,
            preset: entity.preset,
        })),
    }
}
