//! Logging setup on `tracing` and `tracing-subscriber`.
//!
//! # Log Levels
//!
//! - `error`: fatal command failures
//! - `warn`: non-fatal issues, such as fields the json binding ignores
//! - `info`: command progress
//! - `debug`: binding selection, skipped validation rules, batch element failures
//! - `trace`: per-field binds and pointer allocation

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
};

/// Crates whose events follow the configured level.
const CRATE_TARGETS: [&str; 5] = [
    "tagbind_cli",
    "tagbind_core",
    "tagbind_map",
    "tagbind_model",
    "tagbind_validate",
];

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level applied to the crates of this workspace.
    pub level_filter: LevelFilter,
    /// Let `RUST_LOG` replace the configured level when set.
    pub use_env_filter: bool,
    pub with_ansi: bool,
    pub format: LogFormat,
    /// Append to this file instead of writing to stderr.
    pub log_file: Option<PathBuf>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human-readable events.
    #[default]
    Pretty,
    /// Single-line events.
    Compact,
    /// One JSON object per event, with targets.
    Json,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level_filter: LevelFilter::WARN,
            use_env_filter: true,
            with_ansi: true,
            format: LogFormat::default(),
            log_file: None,
        }
    }
}

/// Install the global subscriber. Call once at startup.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a global
/// subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    let subscriber = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            build_subscriber(config, Mutex::new(file))
        }
        None => build_subscriber(config, io::stderr),
    };
    tracing::subscriber::set_global_default(subscriber).map_err(io::Error::other)
}

/// Subscriber for `config` writing through `writer`.
pub fn build_subscriber<W>(config: &LogConfig, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(build_env_filter(config));
    match config.format {
        LogFormat::Json => Box::new(registry.with(fmt::layer().json().with_writer(writer))),
        LogFormat::Compact => Box::new(
            registry.with(
                fmt::layer()
                    .compact()
                    .without_time()
                    .with_target(false)
                    .with_ansi(config.with_ansi)
                    .with_writer(writer),
            ),
        ),
        LogFormat::Pretty => Box::new(
            registry.with(
                fmt::layer()
                    .pretty()
                    .without_time()
                    .with_target(false)
                    .with_ansi(config.with_ansi)
                    .with_writer(writer),
            ),
        ),
    }
}

/// Directive string applying `level` to every workspace crate.
///
/// External crates stay at `warn`.
pub fn default_directives(level: LevelFilter) -> String {
    let level = level.to_string().to_lowercase();
    let mut directives = String::from("warn");
    for target in CRATE_TARGETS {
        directives.push(',');
        directives.push_str(target);
        directives.push('=');
        directives.push_str(&level);
    }
    directives
}

fn build_env_filter(config: &LogConfig) -> EnvFilter {
    let fallback = || EnvFilter::new(default_directives(config.level_filter));
    if config.use_env_filter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
    } else {
        fallback()
    }
}
