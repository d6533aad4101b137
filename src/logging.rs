// 📜 Logging - tracing subscriber writing to a daily rolling file
//
// The terminal UI owns stdout, so diagnostics go to
// `<log dir>/<file_prefix>.YYYY-MM-DD` instead.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Overrides `log.level` from the config file
pub const LOG_ENV: &str = "FINTRACKR_LOG";

/// Install the global subscriber.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes and stops the background writer.
pub fn init(config: &AppConfig) -> Result<WorkerGuard> {
    let dir = config.log_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(&dir, &config.log.file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let directive = filter_directive(&config.log.level, std::env::var(LOG_ENV).ok());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    Ok(guard)
}

/// Env var wins when set and non-blank, then the configured level, then "info"
pub fn filter_directive(configured: &str, env: Option<String>) -> String {
    env.filter(|v| !v.trim().is_empty())
        .or_else(|| Some(configured.trim().to_string()).filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "info".to_string())
}
