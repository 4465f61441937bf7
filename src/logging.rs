//! Logging setup: console plus a daily-rolling file.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Guards that must be kept alive for the process lifetime so buffered
/// log lines reach the file.
pub struct LoggingGuards {
    _guards: Vec<WorkerGuard>,
}

/// Initializes the global subscriber. `RUST_LOG` overrides the default
/// `info` filter.
pub fn init(log_dir: &Path) -> LoggingGuards {
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir).expect("failed to create logs directory");
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "avicam.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    tracing::info!(target: "system", "logging initialized at {:?}", log_dir);

    LoggingGuards {
        _guards: vec![guard],
    }
}
