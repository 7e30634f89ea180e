// ── Area state mapping ──
//
// Pure translation between the vendor's mode strings and the fan model
// used by consumers (a percentage in 16/33/50/67/83/100 steps plus a named
// preset). No I/O happens here.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Percentage reported for each manual level, indexed by `level - 1`.
pub const MANUAL_PERCENTAGES: [u8; 6] = [16, 33, 50, 67, 83, 100];

/// Mode written for any percentage `<= 0`. There is no `Manual 0`.
pub const FANS_OFF: &str = "Fans off";

const INACTIVE_PREFIX: &str = "INACTIVE";

// ── Manual levels ────────────────────────────────────────────────────

/// One of the six manual fan-speed steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ManualLevel(u8);

impl ManualLevel {
    pub fn new(level: u8) -> Option<Self> {
        (1..=6).contains(&level).then_some(Self(level))
    }

    /// All levels in ascending order.
    pub fn all() -> impl Iterator<Item = ManualLevel> {
        (1..=6).map(ManualLevel)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn percentage(self) -> u8 {
        MANUAL_PERCENTAGES[usize::from(self.0 - 1)]
    }

    /// Nearest level to `percentage`, or `None` for `percentage <= 0`.
    ///
    /// Levels are scanned in ascending order and only a strictly smaller
    /// distance replaces the current best, so ties go to the lower level.
    pub fn from_percentage(percentage: i32) -> Option<Self> {
        if percentage <= 0 {
            return None;
        }

        let mut best = Self(1);
        let mut best_diff = u32::MAX;
        for level in Self::all() {
            let diff = (i32::from(level.percentage()) - percentage).unsigned_abs();
            if diff < best_diff {
                best_diff = diff;
                best = level;
            }
        }
        Some(best)
    }
}

impl fmt::Display for ManualLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Manual {}", self.0)
    }
}

// ── Presets ──────────────────────────────────────────────────────────

/// Named operating modes that are not a fixed speed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Preset {
    Boost,
    Humidity,
    Co2,
    Schedule,
    Sleep,
    /// Reported for deactivated areas; never offered for selection.
    Inactive,
}

impl Preset {
    /// Presets a user may pick.
    pub const SELECTABLE: [Preset; 5] = [
        Preset::Boost,
        Preset::Humidity,
        Preset::Co2,
        Preset::Schedule,
        Preset::Sleep,
    ];

    pub fn is_selectable(self) -> bool {
        self != Preset::Inactive
    }

    /// Canonical mode string written to the API for this preset.
    pub fn mode(self) -> &'static str {
        match self {
            Preset::Boost => "Boost ventilation",
            Preset::Humidity => "Humidity regulation",
            Preset::Co2 => "CO2 regulation",
            Preset::Schedule => "Timed program",
            Preset::Sleep => "Snooze",
            Preset::Inactive => INACTIVE_PREFIX,
        }
    }

    /// Names of the selectable presets, in display order.
    pub fn selectable_names() -> Vec<&'static str> {
        Self::SELECTABLE.iter().map(|p| p.as_ref()).collect()
    }
}

// ── Modes ────────────────────────────────────────────────────────────

/// A parsed mode string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    BoostVentilation,
    HumidityRegulation,
    Co2Regulation,
    TimedProgram,
    Snooze,
    FansOff,
    Manual(ManualLevel),
    Inactive,
    /// Text the mapping does not recognize, kept trimmed.
    Unknown(String),
}

impl Mode {
    /// Parse raw API text. Surrounding whitespace is ignored; everything
    /// except the inactive prefix is matched case-sensitively.
    pub fn parse(raw: &str) -> Self {
        let mode = normalize_mode(raw);
        match mode {
            "Boost ventilation" => Self::BoostVentilation,
            "Humidity regulation" => Self::HumidityRegulation,
            "CO2 regulation" => Self::Co2Regulation,
            "Timed program" => Self::TimedProgram,
            "Snooze" => Self::Snooze,
            FANS_OFF => Self::FansOff,
            _ if is_inactive(mode) => Self::Inactive,
            _ => mode
                .strip_prefix("Manual ")
                .and_then(|n| n.parse::<u8>().ok())
                .and_then(ManualLevel::new)
                .map_or_else(|| Self::Unknown(mode.to_owned()), Self::Manual),
        }
    }

    /// Mode to write for a percentage request.
    pub fn for_percentage(percentage: i32) -> Self {
        ManualLevel::from_percentage(percentage).map_or(Self::FansOff, Self::Manual)
    }

    /// Mode to write for a preset request.
    pub fn for_preset(preset: Preset) -> Self {
        match preset {
            Preset::Boost => Self::BoostVentilation,
            Preset::Humidity => Self::HumidityRegulation,
            Preset::Co2 => Self::Co2Regulation,
            Preset::Schedule => Self::TimedProgram,
            Preset::Sleep => Self::Snooze,
            Preset::Inactive => Self::Inactive,
        }
    }

    /// Forward mapping to the fan model.
    pub fn state(&self) -> AreaState {
        let (percentage, preset) = match self {
            Self::BoostVentilation => (None, Some(Preset::Boost)),
            Self::HumidityRegulation => (None, Some(Preset::Humidity)),
            Self::Co2Regulation => (None, Some(Preset::Co2)),
            Self::TimedProgram => (None, Some(Preset::Schedule)),
            Self::Snooze => (None, Some(Preset::Sleep)),
            Self::Inactive => (None, Some(Preset::Inactive)),
            Self::FansOff => (Some(0), None),
            Self::Manual(level) => (Some(level.percentage()), None),
            Self::Unknown(_) => (None, None),
        };
        AreaState { percentage, preset }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BoostVentilation => f.write_str(Preset::Boost.mode()),
            Self::HumidityRegulation => f.write_str(Preset::Humidity.mode()),
            Self::Co2Regulation => f.write_str(Preset::Co2.mode()),
            Self::TimedProgram => f.write_str(Preset::Schedule.mode()),
            Self::Snooze => f.write_str(Preset::Sleep.mode()),
            Self::FansOff => f.write_str(FANS_OFF),
            Self::Manual(level) => level.fmt(f),
            Self::Inactive => f.write_str(INACTIVE_PREFIX),
            Self::Unknown(text) => f.write_str(text),
        }
    }
}

// ── Forward state ────────────────────────────────────────────────────

/// Derived fan state of one area. At most one field is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AreaState {
    pub percentage: Option<u8>,
    pub preset: Option<Preset>,
}

impl AreaState {
    pub fn from_mode(raw: &str) -> Self {
        Mode::parse(raw).state()
    }

    /// Speed a fan UI should display. Boost runs the fans flat out, so it
    /// reads as 100% even though the mode itself is a preset.
    pub fn display_percentage(self) -> Option<u8> {
        match self.preset {
            Some(Preset::Boost) => Some(100),
            _ => self.percentage,
        }
    }

    /// Manual level matching the displayed percentage, `0` when off or
    /// unknown.
    pub fn level(self) -> u8 {
        self.display_percentage()
            .and_then(|p| ManualLevel::from_percentage(i32::from(p)))
            .map_or(0, ManualLevel::get)
    }
}

// ── Free functions ───────────────────────────────────────────────────

/// Strip the surrounding whitespace the API is known to emit.
pub fn normalize_mode(raw: &str) -> &str {
    raw.trim()
}

/// `true` if the trimmed mode starts with `INACTIVE`, ignoring case.
pub fn is_inactive(raw: &str) -> bool {
    normalize_mode(raw)
        .get(..INACTIVE_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(INACTIVE_PREFIX))
}

/// Reverse mapping for percentage writes.
pub fn percentage_to_mode(percentage: i32) -> String {
    Mode::for_percentage(percentage).to_string()
}

/// Reverse mapping for preset writes.
pub fn preset_to_mode(preset: Preset) -> &'static str {
    preset.mode()
}
