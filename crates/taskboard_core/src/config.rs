//! Core configuration loaded from TOML.
//!
//! # Responsibility
//! - Hold the process-wide settings the core needs (day boundary zone,
//!   default card name, logging).
//! - Validate values before any service is built from them.
//!
//! # Invariants
//! - A validated config always yields a valid [`ReferenceZone`].
//! - The reference zone must stay the same for the lifetime of a database;
//!   stored day keys are computed with it.

use crate::logging::LogLevel;
use crate::model::card::DEFAULT_CARD_NAME;
use crate::model::effort::ReferenceZone;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    /// Offset is outside `-1439..=1439` minutes.
    InvalidUtcOffset(i32),
    /// Default card name is blank.
    BlankDefaultCardName,
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::InvalidUtcOffset(minutes) => write!(
                f,
                "reference_utc_offset_minutes must be within -1439..=1439, got {minutes}"
            ),
            Self::BlankDefaultCardName => write!(f, "default_card_name must not be blank"),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Process-wide core settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Minutes east of UTC that define calendar-day boundaries.
    pub reference_utc_offset_minutes: i32,
    /// Name given to cards added without one.
    pub default_card_name: String,
    /// `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` disables file logs.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            reference_utc_offset_minutes: 0,
            default_card_name: DEFAULT_CARD_NAME.to_string(),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Parses and validates TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if ReferenceZone::from_offset_minutes(self.reference_utc_offset_minutes).is_none() {
            return Err(ConfigError::InvalidUtcOffset(
                self.reference_utc_offset_minutes,
            ));
        }
        if self.default_card_name.trim().is_empty() {
            return Err(ConfigError::BlankDefaultCardName);
        }
        LogLevel::parse(&self.log_level).map_err(ConfigError::InvalidLogLevel)?;
        Ok(())
    }

    /// Day-boundary zone; falls back to UTC for an unvalidated bad offset.
    pub fn reference_zone(&self) -> ReferenceZone {
        ReferenceZone::from_offset_minutes(self.reference_utc_offset_minutes).unwrap_or_default()
    }
}
