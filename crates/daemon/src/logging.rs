//! Tracing subscriber setup.
//!
//! Logs always go to stderr. When `logging.log_dir` is set they are also
//! written, without ANSI colors, to `direxplorer.log` in that directory.
//! `RUST_LOG` takes precedence over the configured level.

use std::fs;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// File name used inside `log_dir`.
pub const LOG_FILE_NAME: &str = "direxplorer.log";

/// Pick the filter directive: `verbose` forces debug, else the configured level.
pub fn filter_directive(config: &LoggingConfig, verbose: bool) -> String {
    if verbose {
        "debug".to_string()
    } else {
        config.log_level.to_lowercase()
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the lifetime of the process.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(config, verbose)))
        .context("Failed to build log filter")?;

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr));

    match &config.log_dir {
        Some(log_dir) => {
            fs::create_dir_all(log_dir).with_context(|| {
                format!("Failed to create log directory: {}", log_dir.display())
            })?;

            let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

            registry
                .with(fmt::layer().with_ansi(false).with_writer(file_writer))
                .try_init()
                .context("Failed to install tracing subscriber")?;

            Ok(Some(guard))
        }
        None => {
            registry
                .try_init()
                .context("Failed to install tracing subscriber")?;
            Ok(None)
        }
    }
}
