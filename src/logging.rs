//! Tracing setup: console output plus a daily rolling log file.
//!
//! The filter comes from `RUST_LOG` and defaults to `info`. Log files are named
//! `news_scraper.<date>.log` and the newest seven are kept.

use std::error::Error;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

const LOG_PREFIX: &str = "news_scraper";
const MAX_LOG_FILES: usize = 7;

/// Install the global subscriber.
///
/// The returned guard flushes the file writer when dropped; hold it until
/// the process exits.
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard, Box<dyn Error>> {
    std::fs::create_dir_all(log_dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(log_dir)?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tfmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .with_timer(UtcTime::rfc_3339()),
        )
        .with(
            tfmt::layer()
                .with_ansi(false)
                .with_writer(file_writer)
                .with_timer(UtcTime::rfc_3339()),
        )
        .try_init()?;
    Ok(guard)
}
