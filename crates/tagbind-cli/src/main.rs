//! `tagbind` command line.

use clap::{ColorChoice, Parser};
use std::io::{self, IsTerminal};
use tagbind_cli::commands::{BindOptions, run_bind, run_canonical};
use tagbind_cli::logging::{LogConfig, LogFormat, init_logging};
use tracing::level_filters::LevelFilter;

mod cli;

use crate::cli::{BindArgs, BindingArg, Cli, Command, LogFormatArg, LogLevelArg};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match cli.command {
        Command::Bind(args) => match run_bind(&bind_options(args)) {
            Ok(json) => match serde_json::to_string_pretty(&json) {
                Ok(text) => {
                    println!("{text}");
                    0
                }
                Err(error) => {
                    eprintln!("error: {error}");
                    1
                }
            },
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Canonical { key } => {
            println!("{}", run_canonical(&key));
            0
        }
    };
    std::process::exit(exit_code);
}

fn bind_options(args: BindArgs) -> BindOptions {
    let binding = match args.binding {
        BindingArg::Form => "form",
        BindingArg::Query => "query",
        BindingArg::Header => "header",
        BindingArg::Uri => "uri",
        BindingArg::Json => "json",
    };
    BindOptions {
        shape: args.shape,
        binding: binding.to_string(),
        fields: args.fields,
        body: args.body,
        config: args.config,
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
