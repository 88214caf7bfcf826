//! File logging with daily rotation to platform-standard directories.
//!
//! The terminal belongs to the UI, so nothing is logged to stdout or stderr.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use directories::ProjectDirs;
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, reload};

/// Prefix of every log file; the appender adds `.YYYY-MM-DD`.
const LOG_FILE_PREFIX: &str = "tarot";
const RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Level used until the configured one is known.
pub const STARTUP_LEVEL: &str = "info";

/// Handle for swapping the filter after the subscriber is installed.
pub type ReloadHandle = reload::Handle<EnvFilter, Registry>;

/// Result of initializing the logging system.
pub struct LoggingContext {
    /// Guard that must be held for the application lifetime to ensure logs are flushed.
    pub _guard: WorkerGuard,
    pub session_id: String,
    pub log_directory: PathBuf,
    pub filter_handle: ReloadHandle,
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to determine log directory")]
    NoLogDir,
    #[error("Failed to create log directory: {0}")]
    CreateDir(#[from] std::io::Error),
    #[error("Failed to update log level: {0}")]
    Reload(#[from] reload::Error),
}

/// Generates a 6-character random hex session ID.
fn generate_session_id() -> String {
    use rand::Rng;
    let bytes: [u8; 3] = rand::rng().random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Build the filter: `RUST_LOG` wins, then the configured level.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// macOS: ~/Library/Logs/tarot/
/// Linux: ~/.local/state/tarot/
/// Windows: %LocalAppData%\tarot\
fn log_dir() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        dirs::home_dir().map(|home| home.join("Library").join("Logs").join("tarot"))
    } else {
        let project_dirs = ProjectDirs::from("dev", "tarot", "tarot")?;
        project_dirs
            .state_dir()
            .map(PathBuf::from)
            .or_else(|| Some(project_dirs.data_local_dir().to_path_buf()))
    }
}

/// Initializes the logging system at the given level.
///
/// Runs before the config is loaded so config warnings reach the log file;
/// the configured level is applied afterwards with [`update_log_level`].
/// The returned `WorkerGuard` must be held for the application lifetime.
pub fn init(level: &str) -> Result<LoggingContext, LoggingError> {
    let session_id = generate_session_id();
    let log_dir = log_dir().ok_or(LoggingError::NoLogDir)?;
    fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_span_events(FmtSpan::NONE)
        .with_target(true);

    let (filter, filter_handle) = reload::Layer::new(build_filter(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    info!(session_id = %session_id, version = env!("CARGO_PKG_VERSION"), "session_start");

    Ok(LoggingContext {
        _guard: guard,
        session_id,
        log_directory: log_dir,
        filter_handle,
    })
}

/// Swap the active filter for `level`; `RUST_LOG` still takes precedence.
pub fn update_log_level(handle: &ReloadHandle, level: &str) -> Result<(), LoggingError> {
    handle.reload(build_filter(level))?;
    Ok(())
}

/// Deletes `tarot.*` log files not modified within the retention period.
///
/// Failures are logged and skipped.
pub fn cleanup_old_logs(log_dir: &Path) {
    cleanup_older_than(log_dir, RETENTION, SystemTime::now());
}

fn cleanup_older_than(log_dir: &Path, retention: Duration, now: SystemTime) -> u32 {
    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "log_cleanup_read_dir_failed");
            return 0;
        }
    };

    let mut deleted = 0u32;
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !file_name.starts_with("tarot.") {
            continue;
        }

        let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                warn!(file = %file_name, error = %e, "log_cleanup_metadata_failed");
                continue;
            }
        };

        // Files stamped in the future are left alone.
        let Ok(age) = now.duration_since(modified) else {
            continue;
        };

        if age > retention {
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(file = %file_name, age_days = age.as_secs() / 86400, "log_file_deleted");
                    deleted += 1;
                }
                Err(e) => warn!(file = %file_name, error = %e, "log_cleanup_delete_failed"),
            }
        }
    }

    if deleted > 0 {
        debug!(count = deleted, "log_cleanup_completed");
    }
    deleted
}
