//! Command dispatch: bridges CLI args -> hub operations -> output formatting.

pub mod area;
pub mod areas;
pub mod config_cmd;
pub mod run;
pub mod status;

use secsmart_core::{Coordinator, Hub};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Areas(args) => areas::handle(hub, args, global).await,
        Command::Status(args) => status::handle(hub, args, global).await,
        Command::SetPercentage(args) => area::set_percentage(hub, args, global).await,
        Command::Preset(args) => area::preset(hub, args, global).await,
        Command::On(args) => area::on(hub, args, global).await,
        Command::Off(target) => area::off(hub, target, global).await,
        Command::Boost(args) => area::boost(hub, args, global).await,
        Command::Run => run::handle(hub, global).await,
        // Config and Completions are handled before a hub is built
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}

/// Coordinators matching an optional device filter.
fn select<'a>(hub: &'a Hub, device: Option<&str>) -> Result<Vec<&'a Coordinator>, CliError> {
    match device {
        Some(id) => Ok(vec![hub.coordinator(id)?]),
        None => Ok(hub.coordinators().iter().collect()),
    }
}
