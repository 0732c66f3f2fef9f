//! Logging setup for Ferroscan

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Start the tracing stack: an ANSI stderr layer always, plus a
/// daily-rolling `ferroscan.log` when the log directory is writable.
///
/// Returns the file appender's guard, `None` when only stderr logging is
/// active; `main` holds it so buffered log lines survive until exit.
pub fn init_logging() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ferroscan=debug"));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = log_directory()
        .filter(|dir| std::fs::create_dir_all(dir).is_ok());

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "ferroscan.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_thread_ids(true),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}

/// Where log files go: `FERROSCAN_LOG_DIR` when set, otherwise a
/// per-platform default. The Windows default sits inside the engine's
/// path-excluded data directory, so a realtime watcher aimed at the system
/// drive never feeds the engine's own log churn back into the scan queue.
fn log_directory() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("FERROSCAN_LOG_DIR") {
        return Some(PathBuf::from(dir));
    }
    #[cfg(windows)]
    {
        std::env::var("ProgramData")
            .ok()
            .map(|p| PathBuf::from(p).join("pbl4_av_data").join("logs"))
    }
    #[cfg(not(windows))]
    {
        Some(PathBuf::from("/var/log/ferroscan"))
    }
}
