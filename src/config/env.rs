//! Environment variable configuration
//!
//! The CI marker picks the reporter mode; prefixed variables override the
//! rest of the reporter configuration.

use std::env;
use std::sync::{Mutex, MutexGuard};

use super::{usable_timestamp_format, Mode, ReporterConfig, Termination};
use crate::utils::LogLevel;

/// Marker set by CI systems; its presence alone selects delegating mode
pub const CI_MARKER: &str = "CI";

/// Environment variable prefix
const ENV_PREFIX: &str = "E2E_REPORTER";

/// Serializes scoped environment changes across test threads
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Value of CI, if present at all
    pub ci: Option<String>,
    /// Termination from E2E_REPORTER_TERMINATION
    pub termination: Option<Termination>,
    /// Stamp format from E2E_REPORTER_TIMESTAMP_FORMAT
    pub timestamp_format: Option<String>,
    /// Diagnostics level from E2E_REPORTER_LOG
    pub log_level: Option<LogLevel>,
    /// Config file from E2E_REPORTER_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            ci: env::var_os(CI_MARKER).map(|v| v.to_string_lossy().into_owned()),
            termination: get_env("TERMINATION").and_then(|v| Termination::from_str(&v)),
            timestamp_format: get_env("TIMESTAMP_FORMAT"),
            log_level: get_env("LOG").and_then(|v| LogLevel::from_str(&v)),
            config_file: get_env("CONFIG"),
        }
    }

    /// Whether the CI marker is set, whatever its value
    pub fn in_ci(&self) -> bool {
        self.ci.is_some()
    }

    /// Mode implied by the CI marker
    pub fn mode(&self) -> Mode {
        Mode::from_ci_marker(self.in_ci())
    }

    /// Overlay these settings onto `config`
    ///
    /// The mode always follows the CI marker. A stamp format chrono cannot
    /// render is replaced by the default one.
    pub fn apply(&self, mut config: ReporterConfig) -> ReporterConfig {
        config.mode = self.mode();
        if let Some(termination) = self.termination {
            config.termination = termination;
        }
        if let Some(format) = &self.timestamp_format {
            config.timestamp_format = format.clone();
        }
        config.timestamp_format = usable_timestamp_format(&config.timestamp_format);
        config
    }

    /// Diagnostics level with fallback
    pub fn log_level_or(&self, default: LogLevel) -> LogLevel {
        self.log_level.unwrap_or(default)
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {CI_MARKER}:                           {:?}", self.ci);
        println!("  {ENV_PREFIX}_TERMINATION:      {:?}", self.termination);
        println!("  {ENV_PREFIX}_TIMESTAMP_FORMAT: {:?}", self.timestamp_format);
        println!("  {ENV_PREFIX}_LOG:              {:?}", self.log_level);
        println!("  {ENV_PREFIX}_CONFIG:           {:?}", self.config_file);
        println!("  => mode: {}", self.mode());
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Builder for setting environment variables (useful for testing)
pub struct EnvBuilder {
    vars: Vec<(String, Option<String>)>,
}

impl EnvBuilder {
    /// Create a new environment builder
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    /// Set the CI marker
    pub fn ci(mut self, value: impl Into<String>) -> Self {
        self.vars.push((CI_MARKER.to_string(), Some(value.into())));
        self
    }

    /// Remove the CI marker
    pub fn no_ci(mut self) -> Self {
        self.vars.push((CI_MARKER.to_string(), None));
        self
    }

    /// Set termination
    pub fn termination(mut self, termination: Termination) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_TERMINATION"), Some(termination.to_string())));
        self
    }

    /// Set stamp format
    pub fn timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_TIMESTAMP_FORMAT"), Some(format.into())));
        self
    }

    /// Set diagnostics level
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_LOG"), Some(level.into())));
        self
    }

    /// Set config file path
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_CONFIG"), Some(path.into())));
        self
    }

    /// Remove config file path
    pub fn no_config_file(mut self) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_CONFIG"), None));
        self
    }

    /// Apply and return guard that restores on drop
    ///
    /// The guard also holds a process-wide lock, so scoped environments from
    /// concurrent tests never interleave.
    pub fn apply_scoped(self) -> EnvGuard {
        let lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var_os(k).map(|v| v.to_string_lossy().into_owned())))
            .collect();

        for (key, value) in self.vars {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }

        EnvGuard {
            previous,
            _lock: lock,
        }
    }
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.previous.iter().rev() {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all recognized environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {CI_MARKER}                            Set (to any value) to report through the test handle");
    println!("  {ENV_PREFIX}_TERMINATION       Local error behavior (exit, propagate)");
    println!("  {ENV_PREFIX}_TIMESTAMP_FORMAT  chrono format for line stamps");
    println!("  {ENV_PREFIX}_LOG               Diagnostics level (trace, debug, info, warn, error)");
    println!("  {ENV_PREFIX}_CONFIG            Path to configuration file");
    println!();
    println!("Example:");
    println!("  CI=true cargo test -- --nocapture");
}
