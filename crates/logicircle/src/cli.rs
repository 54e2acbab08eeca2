//! Clap derive structures for the `logicircle` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// logicircle -- Logi Circle camera snapshots from the command line
#[derive(Debug, Parser)]
#[command(
    name = "logicircle",
    version,
    about = "Fetch and watch Logi Circle camera snapshots",
    long_about = "Bridges the cameras on a Logi Circle account into still-image sources.\n\n\
        Lists cameras, downloads single snapshots, or keeps every camera's\n\
        snapshot fresh on an interval and reports availability changes.",
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
    #[arg(long, env = "LOGICIRCLE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Account email (overrides config)
    #[arg(long, short = 'u', env = "LOGICIRCLE_USERNAME", global = true)]
    pub username: Option<String>,

    /// Service root URL (overrides config)
    #[arg(long, env = "LOGICIRCLE_API_URL", global = true, hide = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'f',
        env = "LOGICIRCLE_FORMAT",
        default_value = "table",
        global = true
    )]
    pub format: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, env = "LOGICIRCLE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
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

#[derive(Debug, Clone, ValueEnum)]
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
    /// List the cameras on the account
    #[command(alias = "cams", alias = "ls")]
    Cameras,

    /// Download one camera's current snapshot
    #[command(alias = "snap")]
    Snapshot(SnapshotArgs),

    /// Keep every camera's snapshot fresh and report availability changes
    Watch(WatchArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Snapshot ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Accessory ID or camera name
    pub accessory: String,

    /// Write the image to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Refresh interval in seconds (overrides config)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Consecutive failures before a camera is reported unavailable
    #[arg(long)]
    pub failure_threshold: Option<u32>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Show the resolved configuration (password redacted)
    Show,

    /// Store the account password in the system keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
