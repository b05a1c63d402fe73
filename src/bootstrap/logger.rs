//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, after the effective level is resolved.

use std::path::Path;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::core::error::AppError;

/// How the global subscriber should be built.
#[derive(Debug, Clone, Copy)]
pub struct LogSettings<'a> {
    /// Level directive, e.g. `"info"` or `"wallmatch=debug,tower_http=warn"`.
    pub level: &'a str,
    /// When `true`, `level` wins over `RUST_LOG` (set by `-v` flags).
    pub prefer_level: bool,
    /// Append to this file instead of writing to stderr.
    pub file: Option<&'a Path>,
}

/// Build the [`EnvFilter`] for `settings`.
///
/// With `prefer_level`, `RUST_LOG` is only consulted when `level` does not
/// parse. Otherwise `RUST_LOG` wins and `level` is the fallback.
fn build_filter(settings: &LogSettings<'_>) -> Result<EnvFilter, AppError> {
    let level = settings.level;
    if settings.prefer_level {
        EnvFilter::try_new(level).or_else(|level_err| {
            EnvFilter::try_from_default_env().map_err(|env_err| {
                AppError::Logger(format!(
                    "invalid log level '{level}': {level_err}; RUST_LOG parse failed: {env_err}"
                ))
            })
        })
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))
    }
}

/// Initialise the global tracing subscriber.
pub fn init(settings: LogSettings<'_>) -> Result<(), AppError> {
    let filter = build_filter(&settings)?;

    let (writer, ansi) = match settings.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    AppError::Logger(format!("failed to open log file '{}': {e}", path.display()))
                })?;
            (BoxMakeWriter::new(file), false)
        }
        None => {
            use std::io::IsTerminal as _;
            (BoxMakeWriter::new(std::io::stderr), std::io::stderr().is_terminal())
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}
