// ── Area commands ──
//
// User intents against one area. Each resolves to at most one mode string
// to write; resolution is pure so it can be tested without a server.

use std::str::FromStr;

use serde::Serialize;

use crate::mapping::{Mode, Preset};

/// Percentage used by `TurnOn` and `ToggleBoost` when none is given.
pub const DEFAULT_ON_PERCENTAGE: i32 = 50;

/// All write operations against an area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaCommand {
    SetPercentage(i32),
    SetPreset(String),
    TurnOn {
        percentage: Option<i32>,
        preset: Option<String>,
    },
    TurnOff,
    /// Leave boost if it is active, otherwise enter it.
    ToggleBoost { restore_percentage: Option<i32> },
}

/// What a dispatched command did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// `mode` was written and a refresh was requested.
    Applied { mode: String },
    /// Nothing was sent to the API.
    Ignored { reason: String },
}

/// Result of resolving a command against the area's current preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Write(String),
    Ignore(String),
}

impl AreaCommand {
    /// Work out which mode to write, if any.
    ///
    /// `current` is the preset the area reports right now; only
    /// `ToggleBoost` looks at it.
    pub fn resolve(&self, current: Option<Preset>) -> Resolution {
        match self {
            Self::SetPercentage(p) => Resolution::Write(Mode::for_percentage(*p).to_string()),
            Self::SetPreset(name) => resolve_preset(name),
            Self::TurnOn { preset: Some(name), .. } if !name.is_empty() => resolve_preset(name),
            Self::TurnOn { percentage, .. } => Resolution::Write(
                Mode::for_percentage(percentage.unwrap_or(DEFAULT_ON_PERCENTAGE)).to_string(),
            ),
            Self::TurnOff => Resolution::Write(Mode::FansOff.to_string()),
            Self::ToggleBoost { restore_percentage } => {
                let mode = if current == Some(Preset::Boost) {
                    Mode::for_percentage(restore_percentage.unwrap_or(DEFAULT_ON_PERCENTAGE))
                } else {
                    Mode::for_preset(Preset::Boost)
                };
                Resolution::Write(mode.to_string())
            }
        }
    }
}

/// Only the user-selectable presets produce a write; anything else,
/// including `inactive`, is ignored.
fn resolve_preset(name: &str) -> Resolution {
    match Preset::from_str(name) {
        Ok(preset) if preset.is_selectable() => Resolution::Write(preset.mode().to_owned()),
        _ => Resolution::Ignore(format!(
            "unsupported preset {name:?} (expected one of: {})",
            Preset::selectable_names().join(", ")
        )),
    }
}
