//! Structured logging setup using the `tracing` ecosystem.
//!
//! Console output goes to stderr. The long-running server additionally
//! writes a daily-rotated file, as text or JSON.

use std::path::Path;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use tracing_appender::rolling;

use crate::constants::LOG_FILE_NAME;
use crate::error::PdResult;

/// Directives appended unless the caller already mentions the crate.
/// The pool and HTTP stacks are chatty at debug level.
const QUIET_DEPENDENCIES: &[&str] = &["r2d2=warn", "hyper=warn", "hyper_util=warn", "reqwest=info"];

/// Build the filter for `level`, falling back to `info` when it does not parse.
///
/// `level` may be a plain level (`debug`) or a full directive string
/// (`info,pd_server=trace`).
pub fn build_filter(level: &str) -> EnvFilter {
    let mut directives = level.trim().to_string();
    for quiet in QUIET_DEPENDENCIES {
        let target = quiet.split('=').next().unwrap_or_default();
        if !directives.contains(target) {
            directives.push(',');
            directives.push_str(quiet);
        }
    }
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global subscriber with console and rotating file output.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes the file writer.
pub fn init_logging(level: &str, log_dir: &Path, json_output: bool) -> PdResult<LogGuard> {
    std::fs::create_dir_all(log_dir)?;

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(log_dir, LOG_FILE_NAME));

    let file_layer = if json_output {
        fmt::layer()
            .with_writer(writer)
            .json()
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(build_filter(level))
        .init();

    tracing::info!(
        "logging to {} (level {level}, json {json_output})",
        log_dir.join(LOG_FILE_NAME).display()
    );
    Ok(LogGuard { _guard: guard })
}

/// Keeps the non-blocking file writer alive.
pub struct LogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Console-only logging for short CLI runs and tests. Later calls are no-ops.
pub fn init_console_logging(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(build_filter(level))
        .try_init();
}
