//! Clap derive structures for the `melodex` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use melodex_core::RelationshipKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// melodex -- favorite songs, follow artists and like albums
#[derive(Debug, Parser)]
#[command(
    name = "melodex",
    version,
    about = "Favorite songs, follow artists and like albums from the command line",
    long_about = "Inspect and toggle your relationships with the music catalog.\n\n\
        Kinds: favorite (music), follow (artist), like (album).",
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
    /// Catalog API root (overrides server.base_url)
    #[arg(long, short = 's', env = "MELODEX_URL", global = true)]
    pub server: Option<String>,

    /// Request timeout in seconds (overrides server.timeout)
    #[arg(long, env = "MELODEX_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "MELODEX_INSECURE", global = true)]
    pub insecure: bool,

    /// Config file to use instead of the platform default
    #[arg(long, env = "MELODEX_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MELODEX_OUTPUT",
        default_value = "plain",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, env = "MELODEX_COLOR", default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Plain,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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
    /// Show whether a relationship holds
    #[command(alias = "st")]
    Status(TargetArgs),

    /// Flip a relationship
    #[command(alias = "t")]
    Toggle(TargetArgs),

    /// Turn a relationship on or off
    Set(SetArgs),

    /// Store a session token
    Login(LoginArgs),

    /// Forget the stored session token
    Logout,

    /// Manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Relationship targets ─────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Relationship kind: favorite|follow|like (or music|artist|album)
    pub kind: RelationshipKind,

    /// Song, artist or album id
    pub id: String,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Desired state
    pub state: Switch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Bearer token; read from stdin when omitted
    #[arg(long)]
    pub token: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the effective configuration
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
