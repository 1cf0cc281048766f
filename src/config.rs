use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for a CLI instance
///
/// Every field has a default, so a TOML file only needs the keys it wants
/// to change.
///
/// # Example
///
/// ```rust
/// use cli_forge::config::CliConfig;
///
/// let config = CliConfig::from_toml_str(r#"
///     name = "acme"
///     version = "2.1.0"
///     max_suggestions = 5
/// "#).unwrap();
/// assert_eq!(config.name, "acme");
/// assert!(!config.test_mode);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Program name, shown by the built-in `version` and `help` commands
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Return errors from `run` instead of terminating the process
    #[serde(default)]
    pub test_mode: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Maximum number of "did you mean" entries attached to a
    /// command-not-found error
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Register the `help` and `version` commands
    #[serde(default = "default_builtin_commands")]
    pub builtin_commands: bool,

    #[serde(default)]
    pub default_command: Option<String>,
}

fn default_name() -> String {
    "cli".to_string()
}

fn default_version() -> String {
    "0.0.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_suggestions() -> usize {
    3
}

fn default_builtin_commands() -> bool {
    true
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
            test_mode: false,
            log_level: default_log_level(),
            max_suggestions: default_max_suggestions(),
            builtin_commands: default_builtin_commands(),
            default_command: None,
        }
    }
}

impl CliConfig {
    /// Create a configuration with the given program name and version
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    /// Enable test mode: `run` returns errors instead of exiting
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::config_with_source("Failed to parse config file", e))
    }

    /// Load a configuration file from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::io_with_source(path, "read config file", e))?;
        Self::from_toml_str(&content)
    }

    /// Serialize the configuration back to TOML
    pub fn to_toml_string(&self) -> AppResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AppError::config_with_source("Failed to serialize config", e))
    }
}
