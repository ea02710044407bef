//! Clap derive structures for the `cobridge` CLI.
//!
//! Kept free of crate-internal imports: `build.rs` includes this file
//! directly to render man pages.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// cobridge -- talk to the community game backend from the command line
#[derive(Debug, Parser)]
#[command(
    name = "cobridge",
    version,
    about = "Query the community game backend from the command line",
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
    /// Backend host, `address` or `address:port` (overrides config)
    #[arg(long, short = 'H', env = "COBRIDGE_HOST", global = true)]
    pub host: Option<String>,

    /// API key (overrides config)
    #[arg(long, env = "COBRIDGE_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(long, short = 'o', default_value = "json", global = true)]
    pub output: OutputFormat,

    /// Request timeout in seconds (overrides config)
    #[arg(long, env = "COBRIDGE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one record per line (scripting)
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with the API key and show the account behind it
    Whoami,

    /// Resolve external user ids into identity records
    #[command(alias = "id")]
    Identify(IdentifyArgs),

    /// Send the game-startup notification for a user id
    Startup(StartupArgs),

    /// Inspect or write the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct IdentifyArgs {
    /// Numeric user ids (an empty list is allowed)
    pub ids: Vec<u64>,
}

#[derive(Debug, Args)]
pub struct StartupArgs {
    /// Numeric user id
    pub id: u64,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (secrets redacted)
    Show,

    /// Print the config file location
    Path,

    /// Write a config file
    Init(ConfigInitArgs),
}

#[derive(Debug, Args)]
pub struct ConfigInitArgs {
    /// Backend host, `address` or `address:port`
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Name of the environment variable that holds the API key
    #[arg(long)]
    pub api_key_env: Option<String>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
