//! Logging Infrastructure
//!
//! `tracing-subscriber` with an env filter. Output goes to stdout, or to a
//! daily rolling file under `LOG_DIR` when it is set.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "pos-server";

/// Initialize the logger with defaults (info, plain text, stdout)
pub fn init_logger() -> Option<WorkerGuard> {
    init_logger_with_file(None, false, None)
}

/// Initialize the logger
///
/// `RUST_LOG` wins over `log_level` when set. The returned guard must be held
/// for the lifetime of the process when logging to a file, or buffered lines
/// are lost on exit.
pub fn init_logger_with_file(
    log_level: Option<&str>,
    json: bool,
    log_dir: Option<&str>,
) -> Option<WorkerGuard> {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},sqlx=warn,tower_http=info")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    let file_dir = log_dir.filter(|dir| {
        let path = Path::new(dir);
        path.is_dir() || std::fs::create_dir_all(path).is_ok()
    });

    let Some(dir) = file_dir else {
        let result = if json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        if let Err(e) = result {
            eprintln!("Logger already initialized: {e}");
        }
        return None;
    };

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let builder = builder.with_ansi(false).with_writer(writer);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("Logger already initialized: {e}");
    }
    Some(guard)
}
