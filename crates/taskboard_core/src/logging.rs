//! Rolling-file logging for the board core.
//!
//! # Responsibility
//! - Start the `flexi_logger` backend behind the `log` facade once per process.
//! - Record panics as one-line events without leaking card text.
//!
//! # Invariants
//! - Repeating initialization with the same settings is a no-op.
//! - Different settings after the first start are refused, never applied.
//! - Event payloads carry ids, counts and durations only.

use crate::config::CoreConfig;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "taskboard";
const ROTATE_AT_BYTES: u64 = 8 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 7;
const PANIC_SUMMARY_CHARS: usize = 120;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Verbosity accepted by the board logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Case-insensitive parse; `warning` is accepted as `warn`.
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unsupported log level `{other}`; expected trace|debug|info|warn|error"
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated logger settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LogLevel,
    pub log_dir: PathBuf,
}

impl LogSettings {
    pub fn new(level: &str, log_dir: &str) -> Result<Self, String> {
        let level = LogLevel::parse(level)?;
        let trimmed = log_dir.trim();
        if trimmed.is_empty() {
            return Err("log_dir cannot be empty".to_string());
        }
        let log_dir = PathBuf::from(trimmed);
        if !log_dir.is_absolute() {
            return Err(format!("log_dir must be an absolute path, got `{trimmed}`"));
        }
        Ok(Self { level, log_dir })
    }
}

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

/// Starts file logging at `level` under the absolute directory `log_dir`.
///
/// # Errors
/// Invalid settings, a directory that cannot be created, a backend start
/// failure, or settings that differ from the already active logger.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    let settings = LogSettings::new(level, log_dir)?;
    let active = ACTIVE.get_or_try_init(|| start(&settings))?;
    if active.settings == settings {
        return Ok(());
    }
    Err(format!(
        "logging already active as {} at `{}`; refusing to switch to {} at `{}`",
        active.settings.level,
        active.settings.log_dir.display(),
        settings.level,
        settings.log_dir.display()
    ))
}

/// Starts file logging when the config names a `log_dir`.
///
/// Returns `Ok(false)` without touching the logger otherwise.
pub fn init_logging_from_config(config: &CoreConfig) -> Result<bool, String> {
    let Some(log_dir) = config.log_dir.as_deref() else {
        return Ok(false);
    };
    let log_dir = log_dir
        .to_str()
        .ok_or_else(|| format!("log_dir is not valid UTF-8: `{}`", log_dir.display()))?;
    init_logging(&config.log_level, log_dir)?;
    Ok(true)
}

/// Settings of the active logger, if any.
pub fn logging_status() -> Option<LogSettings> {
    ACTIVE.get().map(|active| active.settings.clone())
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        LogLevel::Debug.as_str()
    } else {
        LogLevel::Info.as_str()
    }
}

fn start(settings: &LogSettings) -> Result<ActiveLogger, String> {
    let log_dir: &Path = &settings.log_dir;
    std::fs::create_dir_all(log_dir)
        .map_err(|err| format!("failed to create `{}`: {err}", log_dir.display()))?;

    let handle = Logger::try_with_str(settings.level.as_str())
        .map_err(|err| format!("invalid log level `{}`: {err}", settings.level))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    install_panic_hook();
    info!(
        "event=core_init module=core status=ok version={} level={} log_dir={}",
        env!("CARGO_PKG_VERSION"),
        settings.level,
        log_dir.display()
    );

    Ok(ActiveLogger {
        settings: settings.clone(),
        _handle: handle,
    })
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }

    let chained = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let location = panic
            .location()
            .map_or_else(|| "unknown".to_string(), |at| format!("{}:{}", at.file(), at.line()));
        let payload = panic
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        error!(
            "event=panic_captured module=core status=error location={location} payload={}",
            one_line(payload, PANIC_SUMMARY_CHARS)
        );
        chained(panic);
    }));
}

/// Joins lines and caps the char count of a free-text value.
fn one_line(value: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for (index, ch) in value.chars().enumerate() {
        if index == max_chars {
            out.push_str("...");
            break;
        }
        out.push(if ch == '\n' || ch == '\r' { ' ' } else { ch });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_parse_is_case_insensitive() {
        assert_eq!(LogLevel::parse("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::parse(" warning ").unwrap(), LogLevel::Warn);
        assert!(LogLevel::parse("verbose").is_err());
    }

    #[test]
    fn settings_reject_blank_and_relative_dirs() {
        assert!(LogSettings::new("info", "  ").unwrap_err().contains("empty"));
        assert!(LogSettings::new("info", "logs/dev")
            .unwrap_err()
            .contains("absolute"));
    }

    #[test]
    fn one_line_flattens_and_caps() {
        assert_eq!(one_line("card\nname\rleak", 8), "card nam...");
        assert_eq!(one_line("short", 8), "short");
    }

    #[test]
    fn config_without_log_dir_skips_file_logging() {
        assert_eq!(init_logging_from_config(&CoreConfig::default()), Ok(false));
    }

    #[test]
    fn init_logging_is_idempotent_and_rejects_reconfiguration() {
        // The logger outlives the test, so the directory is not cleaned up.
        let root = std::env::temp_dir().join(format!("taskboard-logging-{}", uuid::Uuid::new_v4()));
        let log_dir = root.join("logs");
        let log_dir_str = log_dir.to_str().unwrap().to_string();

        init_logging("info", &log_dir_str).unwrap();
        init_logging("INFO", &log_dir_str).unwrap();

        assert!(init_logging("debug", &log_dir_str)
            .unwrap_err()
            .contains("refusing to switch"));
        let other = root.join("other");
        assert!(init_logging("info", other.to_str().unwrap())
            .unwrap_err()
            .contains("refusing to switch"));

        let active = logging_status().unwrap();
        assert_eq!(active.level, LogLevel::Info);
        assert_eq!(active.log_dir, log_dir);
    }
}
