//! Configuration file management
//!
//! Handles finding, loading, and validating configuration files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{EnvConfig, ReporterConfig, Termination};

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./e2e-reporter.yaml",
    "./e2e-reporter.yml",
    "./.e2e-reporter.yaml",
    "~/.config/e2e-reporter/config.yaml",
];

/// Full configuration file structure
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Version of config file format
    #[serde(default = "default_version")]
    pub version: String,

    /// Reporter settings
    #[serde(default)]
    pub reporter: ReporterConfig,

    /// Namespaces whose events are dumped when a test fails
    #[serde(default)]
    pub event_namespaces: Vec<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            reporter: ReporterConfig::default(),
            event_namespaces: Vec::new(),
        }
    }
}

impl ConfigFile {
    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self> {
        match Self::find() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load the file named by `E2E_REPORTER_CONFIG`, else the default location
    pub fn load_for(env: &EnvConfig) -> Result<Self> {
        match &env.config_file {
            Some(path) => Self::load(expand_path(path)),
            None => Self::load_default(),
        }
    }

    /// Effective configuration: config file first, then the environment overlay
    ///
    /// A file that cannot be loaded is logged and replaced by the defaults,
    /// so resolving never fails.
    pub fn resolve() -> Self {
        let env = EnvConfig::load();
        let mut file = match Self::load_for(&env) {
            Ok(file) => file,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Ignoring config file");
                Self::default()
            }
        };
        file.reporter = env.apply(file.reporter);
        debug!(
            mode = %file.reporter.mode,
            namespaces = file.event_namespaces.len(),
            "Resolved reporter configuration"
        );
        file
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !["1.0"].contains(&self.version.as_str()) {
            anyhow::bail!("Unsupported config version: {}", self.version);
        }

        self.reporter.validate()?;

        if let Some(ns) = self.event_namespaces.iter().find(|ns| ns.trim().is_empty()) {
            anyhow::bail!("Invalid event namespace: {ns:?}");
        }

        Ok(())
    }

    /// Generate example configuration
    pub fn example() -> Self {
        Self {
            version: default_version(),
            reporter: ReporterConfig::default().with_termination(Termination::Exit),
            event_namespaces: vec!["encryption-e2e".to_string()],
        }
    }
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
