//! Configuration module
//!
//! Decides how a reporter behaves: which mode it runs in, what happens when
//! a local run hits an error, and how lines are stamped.

mod env;
mod file;

pub use env::{print_env_help, EnvBuilder, EnvConfig, EnvGuard, CI_MARKER};
pub use file::ConfigFile;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::reporter::ReporterError;
use crate::utils::{is_valid_format, STAMP_MILLI};

/// Where reported lines go
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Echo straight to the console; used on developer machines
    Local,
    /// Pass everything through to the test handle; used under CI
    Delegating,
}

impl Mode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "local" => Some(Mode::Local),
            "delegating" | "delegate" | "ci" => Some(Mode::Delegating),
            _ => None,
        }
    }

    /// Mode implied by the presence of the CI marker
    pub fn from_ci_marker(present: bool) -> Self {
        if present {
            Mode::Delegating
        } else {
            Mode::Local
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Local => write!(f, "local"),
            Mode::Delegating => write!(f, "delegating"),
        }
    }
}

/// What a local-mode error does after the teardown hook has run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Exit the process with code -1
    Exit,
    /// Return [`ReporterError::Terminated`] to the caller
    Propagate,
}

impl Termination {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "exit" => Some(Termination::Exit),
            "propagate" => Some(Termination::Propagate),
            _ => None,
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exit => write!(f, "exit"),
            Termination::Propagate => write!(f, "propagate"),
        }
    }
}

/// Reporter configuration
///
/// The mode is never read from or written to a file. It comes from the CI
/// marker or from code, so a file carrying `mode` is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReporterConfig {
    /// Output mode
    #[serde(skip, default = "default_mode")]
    pub mode: Mode,

    /// Local-mode error behavior
    #[serde(default = "default_termination")]
    pub termination: Termination,

    /// chrono format string for line stamps
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

fn default_mode() -> Mode {
    Mode::Delegating
}

fn default_termination() -> Termination {
    Termination::Exit
}

fn default_timestamp_format() -> String {
    STAMP_MILLI.to_string()
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            termination: default_termination(),
            timestamp_format: default_timestamp_format(),
        }
    }
}

impl ReporterConfig {
    /// Configuration resolved from the config file and the process environment
    ///
    /// See [`ConfigFile::resolve`].
    pub fn from_env() -> Self {
        ConfigFile::resolve().reporter
    }

    pub fn local() -> Self {
        Self::default().with_mode(Mode::Local)
    }

    pub fn delegating() -> Self {
        Self::default().with_mode(Mode::Delegating)
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ReporterError> {
        check_timestamp_format(&self.timestamp_format)
    }
}

/// Reject blank stamp formats and formats with specifiers chrono cannot render
pub fn check_timestamp_format(format: &str) -> Result<(), ReporterError> {
    if format.trim().is_empty() {
        return Err(ReporterError::Config(
            "timestamp_format must not be empty".to_string(),
        ));
    }
    if !is_valid_format(format) {
        return Err(ReporterError::Config(format!(
            "timestamp_format {format:?} contains an unknown specifier"
        )));
    }
    Ok(())
}

/// `format` if it passes [`check_timestamp_format`], else [`STAMP_MILLI`]
pub(crate) fn usable_timestamp_format(format: &str) -> String {
    match check_timestamp_format(format) {
        Ok(()) => format.to_string(),
        Err(e) => {
            warn!(error = %e, fallback = STAMP_MILLI, "Ignoring timestamp format");
            STAMP_MILLI.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReporterConfig::default();
        assert_eq!(config.mode, Mode::Delegating);
        assert_eq!(config.termination, Termination::Exit);
        assert_eq!(config.timestamp_format, STAMP_MILLI);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(Mode::from_str("LOCAL"), Some(Mode::Local));
        assert_eq!(Mode::from_str("ci"), Some(Mode::Delegating));
        assert_eq!(Mode::from_str("remote"), None);
        assert_eq!(Mode::Local.to_string(), "local");
    }

    #[test]
    fn test_mode_from_ci_marker() {
        assert_eq!(Mode::from_ci_marker(false), Mode::Local);
        assert_eq!(Mode::from_ci_marker(true), Mode::Delegating);
    }

    #[test]
    fn test_termination_parsing() {
        assert_eq!(Termination::from_str("exit"), Some(Termination::Exit));
        assert_eq!(Termination::from_str("Propagate"), Some(Termination::Propagate));
        assert_eq!(Termination::from_str("abort"), None);
    }

    #[test]
    fn test_validate_empty_format() {
        let config = ReporterConfig::local().with_timestamp_format("  ");
        assert!(matches!(config.validate(), Err(ReporterError::Config(_))));
    }

    #[test]
    fn test_validate_unknown_specifier() {
        let config = ReporterConfig::delegating().with_timestamp_format("%Q");
        assert!(matches!(config.validate(), Err(ReporterError::Config(_))));

        let config = ReporterConfig::delegating().with_timestamp_format("%H:%M:%S");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_usable_timestamp_format() {
        assert_eq!(usable_timestamp_format("%H:%M"), "%H:%M");
        assert_eq!(usable_timestamp_format("%Q"), STAMP_MILLI);
        assert_eq!(usable_timestamp_format(""), STAMP_MILLI);
    }

    #[test]
    fn test_serde_defaults() {
        let config: ReporterConfig = serde_yaml::from_str("termination: propagate\n").unwrap();
        assert_eq!(config.mode, Mode::Delegating);
        assert_eq!(config.termination, Termination::Propagate);
        assert_eq!(config.timestamp_format, STAMP_MILLI);
    }

    #[test]
    fn test_mode_not_serialized() {
        let yaml = serde_yaml::to_string(&ReporterConfig::local()).unwrap();
        assert!(!yaml.contains("mode"));

        let err = serde_yaml::from_str::<ReporterConfig>("mode: local\n").unwrap_err();
        assert!(err.to_string().contains("mode"));
    }
}
