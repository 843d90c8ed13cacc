//! CLI argument definitions for `dpoll`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "dpoll",
    version,
    about = "Deliberative-poll comparison tables from survey panel data",
    long_about = "Compare survey responses across time points and experimental groups.\n\n\
                  Reads a CSV dataset with a sidecar TOML codebook and writes one table per\n\
                  ordinal variable, breakdown and weight as .xlsx (and .docx when small enough)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a dataset and write every comparison table.
    Outputs(DatasetArgs),

    /// Validate a dataset and write its JSON validation report only.
    Check(DatasetArgs),
}

#[derive(Parser)]
pub struct DatasetArgs {
    /// CSV dataset; its codebook is `<stem>.codebook.toml` in the same folder.
    #[arg(value_name = "DATASET")]
    pub dataset: PathBuf,

    /// Hide the aggregation progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
