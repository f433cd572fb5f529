//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "tagbind",
    version,
    about = "Bind request values into tagged shapes",
    long_about = "Bind form, query, header, route or JSON values into a destination\n\
                  described by a shape file, then validate and print the result as JSON."
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

    /// Log output format.
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
    /// Bind values into a shape and print the destination as JSON.
    Bind(BindArgs),

    /// Print the canonical form of a header key.
    Canonical {
        #[arg(value_name = "KEY")]
        key: String,
    },
}

#[derive(Parser)]
pub struct BindArgs {
    /// JSON file describing the destination shape.
    #[arg(long = "shape", value_name = "PATH")]
    pub shape: PathBuf,

    /// Binding to run.
    #[arg(long = "binding", value_enum, default_value = "form")]
    pub binding: BindingArg,

    /// Source value as KEY=VALUE; repeat for multiple values.
    #[arg(long = "field", short = 'f', value_name = "KEY=VALUE")]
    pub fields: Vec<String>,

    /// Request body file for the json binding.
    #[arg(long = "body", value_name = "PATH")]
    pub body: Option<PathBuf>,

    /// TOML binding configuration.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum BindingArg {
    Form,
    Query,
    Header,
    Uri,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
