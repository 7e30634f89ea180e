//! Clap derive structures for the `secsmart` CLI.
//!
//! Defines the command tree, global flags, and shared types. Also compiled
//! by `build.rs` for man page generation, so it only depends on clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// secsmart -- control SEC Smart ventilation areas from the command line
#[derive(Debug, Parser)]
#[command(
    name = "secsmart",
    version,
    about = "Control SEC Smart ventilation areas from the command line",
    long_about = "Reads area state from the SEC Smart cloud API, shows each active area \
        as a fan with a speed percentage and preset, and writes mode changes back.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "SECSMART_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// API base URL (overrides config)
    #[arg(long, env = "SECSMART_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// API bearer token
    #[arg(long, env = "SECSMART_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SECSMART_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the active areas of one or all devices
    #[command(alias = "ls")]
    Areas(DeviceFilterArgs),

    /// Show polling health (fresh or stale, last error) per device
    Status(DeviceFilterArgs),

    /// Set an area's fan speed; snaps to the nearest manual level
    #[command(alias = "speed")]
    SetPercentage(SetPercentageArgs),

    /// Select a preset (boost, humidity, co2, schedule, sleep)
    Preset(PresetArgs),

    /// Turn an area on (preset, percentage, or 50%)
    On(OnArgs),

    /// Turn an area's fans off
    Off(AreaTarget),

    /// Toggle boost ventilation on an area
    Boost(BoostArgs),

    /// Poll continuously and print area changes until interrupted
    #[command(alias = "watch")]
    Run,

    /// Manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeviceFilterArgs {
    /// Device id (all configured devices when omitted)
    pub device: Option<String>,
}

#[derive(Debug, Args)]
pub struct AreaTarget {
    /// Device id
    pub device: String,

    /// Area number (1-6)
    #[arg(value_parser = clap::value_parser!(u8).range(1..=6))]
    pub area: u8,
}

// ── Area Commands ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SetPercentageArgs {
    #[command(flatten)]
    pub target: AreaTarget,

    /// Fan speed percentage; 0 or less turns the fans off
    #[arg(allow_negative_numbers = true)]
    pub percentage: i32,
}

#[derive(Debug, Args)]
pub struct PresetArgs {
    #[command(flatten)]
    pub target: AreaTarget,

    /// Preset name
    pub preset: String,
}

#[derive(Debug, Args)]
pub struct OnArgs {
    #[command(flatten)]
    pub target: AreaTarget,

    /// Fan speed percentage
    #[arg(long, short = 'p', allow_negative_numbers = true)]
    pub percentage: Option<i32>,

    /// Preset name (takes precedence over --percentage)
    #[arg(long)]
    pub preset: Option<String>,
}

#[derive(Debug, Args)]
pub struct BoostArgs {
    #[command(flatten)]
    pub target: AreaTarget,

    /// Percentage to return to when leaving boost
    #[arg(long, short = 'r')]
    pub restore: Option<i32>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a starter config file for the given devices
    Init {
        /// Device id (repeatable)
        #[arg(long = "device", short = 'd', required = true)]
        devices: Vec<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the config file location
    Path,

    /// Display the effective configuration (token masked)
    Show,

    /// Store the API token in the system keyring
    SetToken {
        /// Token value (read from stdin when omitted)
        token: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
