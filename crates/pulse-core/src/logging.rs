use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing_appender::rolling;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "pulse.log";
const LOG_RETENTION_DAYS: u64 = 7;

/// Return the log directory path.
///
/// Precedence: `PULSE_LOG_DIR` env var > platform default.
/// macOS: `~/Library/Logs/pulse/`
/// Linux: `$XDG_DATA_HOME/pulse/logs/` or `~/.local/share/pulse/logs/`
pub fn log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PULSE_LOG_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = dirs::home_dir() {
            return home.join("Library").join("Logs").join("pulse");
        }
    }

    #[cfg(not(target_os = "macos"))]
    {
        if let Some(data) = dirs::data_dir() {
            return data.join("pulse").join("logs");
        }
    }

    PathBuf::from("logs")
}

/// Remove dashboard log files older than `max_age_days` from `log_path`.
///
/// Only files starting with the rolling appender's prefix are touched, so a
/// shared log directory keeps everything else.
fn cleanup_old_logs(log_path: &Path, max_age_days: u64) {
    let cutoff = SystemTime::now() - Duration::from_secs(max_age_days * 86400);
    let Ok(entries) = std::fs::read_dir(log_path) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(LOG_FILE_PREFIX) {
            continue;
        }
        let modified = entry.metadata().and_then(|meta| meta.modified());
        if matches!(modified, Ok(modified) if modified < cutoff) {
            let _ = std::fs::remove_file(entry.path());
        }
    }
}

/// Initialize file logging.
///
/// Filter controlled by `PULSE_LOG` or `RUST_LOG` (default: `info`).
/// Output: daily rotation in [`log_dir`], 7-day retention. Nothing is written
/// to the terminal, which belongs to the dashboard.
pub fn init() {
    let filter = EnvFilter::try_from_env("PULSE_LOG")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let log_path = log_dir();
    if let Err(e) = std::fs::create_dir_all(&log_path) {
        eprintln!(
            "warning: failed to create log directory {:?}: {}",
            log_path, e
        );
    }

    cleanup_old_logs(&log_path, LOG_RETENTION_DAYS);

    let file_appender = rolling::daily(&log_path, LOG_FILE_PREFIX);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    // Serialize env-mutating tests to avoid data races.
    static ENV_LOCK: StdMutex<()> = StdMutex::new(());

    #[test]
    fn log_dir_respects_env_override() {
        let _guard = ENV_LOCK.lock().unwrap();
        let original = std::env::var("PULSE_LOG_DIR").ok();

        unsafe { std::env::set_var("PULSE_LOG_DIR", "/tmp/pulse-test-logs") };
        assert_eq!(log_dir(), PathBuf::from("/tmp/pulse-test-logs"));

        match original {
            Some(v) => unsafe { std::env::set_var("PULSE_LOG_DIR", v) },
            None => unsafe { std::env::remove_var("PULSE_LOG_DIR") },
        }
    }

    #[test]
    fn log_dir_default_ends_in_pulse() {
        let _guard = ENV_LOCK.lock().unwrap();
        let original = std::env::var("PULSE_LOG_DIR").ok();

        unsafe { std::env::remove_var("PULSE_LOG_DIR") };
        let dir = log_dir();
        assert!(dir.components().any(|c| c.as_os_str() == "pulse") || dir == PathBuf::from("logs"));

        if let Some(v) = original {
            unsafe { std::env::set_var("PULSE_LOG_DIR", v) };
        }
    }

    #[test]
    fn cleanup_old_logs_removes_stale_files() {
        let tmp = std::env::temp_dir().join("pulse-test-cleanup");
        let _ = std::fs::create_dir_all(&tmp);

        let old_a = tmp.join("pulse.log.2025-01-01");
        let old_b = tmp.join("pulse.log.2025-01-02");
        let other = tmp.join("other.txt");
        std::fs::write(&old_a, "a").unwrap();
        std::fs::write(&old_b, "b").unwrap();
        std::fs::write(&other, "c").unwrap();

        // max_age_days=0 means cutoff is "now", so all matching files get cleaned
        cleanup_old_logs(&tmp, 0);
        assert!(!old_a.exists(), "pulse log file should be deleted");
        assert!(!old_b.exists(), "pulse log file should be deleted");
        assert!(other.exists(), "unrelated file should be preserved");

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
