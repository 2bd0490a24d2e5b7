use std::fs::OpenOptions;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::JsonFields;
use tracing_subscriber::prelude::*;

/// Install the global subscriber, writing JSON lines to `log_path`.
///
/// All sessions log through one background writer fed by a queue, so lines
/// from concurrent connections never interleave and never block the protocol.
/// The returned guard flushes the queue when dropped.
pub fn init(log_path: &Path, default_level: &str) -> anyhow::Result<WorkerGuard> {
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir).inspect_err(|e| {
            eprintln!("Failed to create log directory {:?}: {}", dir, e);
        })?;
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .inspect_err(|e| {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
        })?;

    let (writer, guard) = tracing_appender::non_blocking(log_file);

    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(writer)
        .fmt_fields(JsonFields::default());

    // Use RUST_LOG if set, otherwise the configured level
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .try_init()?;

    Ok(guard)
}
