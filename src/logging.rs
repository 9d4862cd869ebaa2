//! Logging setup for TurnQueue using tracing.
//!
//! The daemon logs to a daily rolling file under the project data directory
//! and to stderr. `TURNQUEUE_LOG` overrides the filter, then `RUST_LOG`.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE: &str = "turnqueue.log";

const FILTER_ENV: &str = "TURNQUEUE_LOG";
const DEFAULT_FILTER: &str = "info,turnqueue=debug";

/// Live logging setup. Dropping it flushes the file writer.
pub struct LogHandle {
    _guard: WorkerGuard,
    dir: PathBuf,
}

impl LogHandle {
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Initialize logging in the default log directory.
pub fn init() -> Result<LogHandle> {
    init_in(log_dir()?)
}

/// Initialize logging with the rolling file in `dir`.
pub fn init_in(dir: PathBuf) -> Result<LogHandle> {
    std::fs::create_dir_all(&dir)?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, LOG_FILE));

    // Watchdog timers and listener workers hop between runtime threads.
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_thread_names(true)
        .with_thread_ids(true)
        .with_line_number(true);

    let console_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter())
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    tracing::info!("Logging to {}", dir.join(LOG_FILE).display());
    Ok(LogHandle { _guard: guard, dir })
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(FILTER_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn log_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "turnqueue", "turnqueue")
        .ok_or_else(|| anyhow::anyhow!("Could not determine the data directory"))?;

    Ok(dirs.data_dir().join("logs"))
}

/// Console-only logging for tests. Safe to call from every test.
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("debug")))
        .with(fmt::layer().with_test_writer())
        .try_init();
}
