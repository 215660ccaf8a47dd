//! Clap derive structures for the `krms` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// krms -- KRMS device report
#[derive(Debug, Parser)]
#[command(
    name = "krms",
    version,
    about = "Fetch, enrich and summarize KRMS devices, then write and email the report",
    long_about = "Fetches every device from the KRMS API, resolves each device's IP to a\n\
        location, writes CSV, XLSX and HTML reports and emails the summary.\n\n\
        Credentials and SMTP settings come from the environment (or a .env file);\n\
        endpoints and tuning from krms.toml and KRMS_* variables.",
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
    /// Output format for the printed summary
    #[arg(
        long,
        short = 'o',
        env = "KRMS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Log line format on stderr
    #[arg(long, env = "KRMS_LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

// ── Output Enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
    /// Plain `key: value` lines (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the report: fetch, enrich, summarize, write, email
    Run(RunArgs),

    /// Load and validate configuration, then print it with secrets masked
    #[command(alias = "check")]
    CheckConfig(SourceArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Where configuration is read from.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Load variables from this file instead of ./.env
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Settings file (default: ./krms.toml)
    #[arg(long, short = 'c', env = "KRMS_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Write the reports but do not send the email
    #[arg(long)]
    pub no_email: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
