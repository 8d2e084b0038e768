//! Initialize tracing/logging for the gateway.
//!
//! Output always goes to stdout. When a log file is configured it is opened in
//! append mode and receives a copy of every line. `RUST_LOG` overrides the
//! configured level.

use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::{ChronoLocal, ChronoUtc, FormatTime};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

use crate::config::LogSettings;

pub fn level_from_str(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" | "warning" => Level::WARN,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    }
}

/// The effective level: `debug = true` lowers anything above DEBUG to DEBUG.
pub fn effective_level(settings: &LogSettings) -> Level {
    let level = level_from_str(&settings.level);
    if settings.debug && level < Level::DEBUG {
        Level::DEBUG
    } else {
        level
    }
}

/// Installs the global subscriber. Calling it again is harmless; only the
/// first call takes effect. Fails only if the log file cannot be opened.
pub fn init(settings: &LogSettings) -> io::Result<()> {
    let writer = match &settings.path {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(io::stdout.and(Arc::new(file)))
        }
        None => BoxMakeWriter::new(io::stdout),
    };

    let level = effective_level(settings);
    if settings.utc {
        install(ChronoUtc::rfc_3339(), level, settings.debug, writer);
    } else {
        install(ChronoLocal::rfc_3339(), level, settings.debug, writer);
    }
    Ok(())
}

fn install<T>(timer: T, level: Level, with_location: bool, writer: BoxMakeWriter)
where
    T: FormatTime + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    // try_init so tests can call this repeatedly
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(with_location)
        .with_line_number(with_location)
        .with_timer(timer)
        .with_writer(writer)
        .try_init();
}
