//! File logging setup.
//!
//! Logs go to a file under the taskdeck home directory so tracing output
//! never interleaves with streamed text on the terminal. The returned guard
//! must live for the whole process or buffered lines are lost.

use anyhow::{Context, Result};
use taskdeck_core::config::{Config, paths};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_FILTER: &str = "taskdeck=info,taskdeck_core=info";

/// Initializes the tracing subscriber with a non-blocking file writer.
///
/// Filter resolution order: RUST_LOG, then the `log.level` config key,
/// then a quiet default.
pub fn init(config: &Config) -> Result<WorkerGuard> {
    let log_dir = paths::logs_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| {
            let level = config.log.level.as_deref()?;
            EnvFilter::try_new(level).ok()
        })
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    let file_appender = tracing_appender::rolling::never(&log_dir, "taskdeck.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
        .init();

    Ok(guard)
}
