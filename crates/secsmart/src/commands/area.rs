//! Area write commands: set-percentage, preset, on, off, boost.

use owo_colors::OwoColorize;

use secsmart_core::{AreaId, CommandOutcome, Dispatcher, Hub};

use crate::cli::{AreaTarget, BoostArgs, GlobalOpts, OnArgs, PresetArgs, SetPercentageArgs};
use crate::error::CliError;
use crate::output;

/// Resolve the dispatcher and area for a target.
fn resolve(hub: &Hub, target: &AreaTarget) -> Result<(Dispatcher, AreaId), CliError> {
    let dispatcher = hub.dispatcher(&target.device)?;
    let area = AreaId::try_from(target.area)?;
    Ok((dispatcher, area))
}

/// Load the device state so commands that depend on the current preset
/// (and the "area is active" check) see the real value.
async fn prepare(hub: &Hub, target: &AreaTarget) -> Result<(Dispatcher, AreaId), CliError> {
    let (dispatcher, area) = resolve(hub, target)?;
    let snapshot = dispatcher
        .coordinator()
        .refresh()
        .await
        .map_err(secsmart_core::CoreError::from)?;

    if snapshot.area(area).is_none_or(|r| secsmart_core::mapping::is_inactive(&r.mode)) {
        return Err(CliError::AreaNotFound {
            device_id: target.device.clone(),
            area: target.area,
        });
    }
    Ok((dispatcher, area))
}

fn report(
    outcome: &CommandOutcome,
    target: &AreaTarget,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        outcome,
        |o| match o {
            CommandOutcome::Applied { mode } => {
                let mode = if color {
                    mode.green().to_string()
                } else {
                    mode.clone()
                };
                format!("{} area {}: {mode}", target.device, target.area)
            }
            CommandOutcome::Ignored { reason } => {
                let label = if color {
                    "ignored".yellow().to_string()
                } else {
                    "ignored".into()
                };
                format!("{} area {}: {label} ({reason})", target.device, target.area)
            }
        },
        |o| match o {
            CommandOutcome::Applied { mode } => mode.clone(),
            CommandOutcome::Ignored { .. } => String::new(),
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn set_percentage(
    hub: &Hub,
    args: SetPercentageArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (dispatcher, area) = prepare(hub, &args.target).await?;
    let outcome = dispatcher.set_percentage(area, args.percentage).await?;
    report(&outcome, &args.target, global)
}

pub async fn preset(hub: &Hub, args: PresetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (dispatcher, area) = prepare(hub, &args.target).await?;
    let outcome = dispatcher.set_preset(area, &args.preset).await?;
    report(&outcome, &args.target, global)
}

pub async fn on(hub: &Hub, args: OnArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (dispatcher, area) = prepare(hub, &args.target).await?;
    let outcome = dispatcher
        .turn_on(area, args.percentage, args.preset)
        .await?;
    report(&outcome, &args.target, global)
}

pub async fn off(hub: &Hub, target: AreaTarget, global: &GlobalOpts) -> Result<(), CliError> {
    let (dispatcher, area) = prepare(hub, &target).await?;
    let outcome = dispatcher.turn_off(area).await?;
    report(&outcome, &target, global)
}

pub async fn boost(hub: &Hub, args: BoostArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (dispatcher, area) = prepare(hub, &args.target).await?;
    let outcome = dispatcher.toggle_boost(area, args.restore).await?;
    report(&outcome, &args.target, global)
}
