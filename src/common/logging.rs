//! Logging and tracing configuration
//!
//! Progress for humans is printed by the runner; tracing carries the
//! protocol-level detail (requests, responses, capability payloads).

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize tracing for the CLI
///
/// Logs go to stderr and are controlled by `RUST_LOG`. The default is INFO
/// for this crate and WARN for dependencies; `verbose` raises this crate to
/// DEBUG. When `log_file` is given, a second layer writes full detail there.
///
/// The returned guard must be held until exit so buffered file output is flushed.
pub fn init_cli(verbose: bool, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("smoke=debug,warn")
        } else {
            EnvFilter::new("smoke=info,warn")
        }
    });

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let (file_layer, guard) = match log_file.and_then(open_log_writer) {
        Some((writer, guard)) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(EnvFilter::new("smoke=trace,info"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer.with_filter(filter))
        .with(file_layer)
        .init();

    guard
}

/// Open an appending, non-blocking writer for the log file
///
/// A log file that cannot be opened is reported and skipped; the run goes on
/// with stderr logging only.
fn open_log_writer(
    path: &Path,
) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Warning: Could not create log directory {}: {}", dir.display(), e);
            return None;
        }
    }

    match std::fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(tracing_appender::non_blocking(file)),
        Err(e) => {
            eprintln!("Warning: Could not open log file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_writer_creates_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("logs").join("smoke.log");
        assert!(open_log_writer(&path).is_some());
        assert!(path.is_file());
    }

    #[test]
    fn test_log_writer_skips_directory_path() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(open_log_writer(tmp.path()).is_none());
    }
}
