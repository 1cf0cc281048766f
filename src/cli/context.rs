//! CLI context: configuration discovery and logging setup
//!
//! The configuration file is taken from `CLI_FORGE_CONFIG` when set;
//! otherwise built-in defaults are used.

use anyhow::{Context, Result};
use cli_forge::CliConfig;
use std::path::PathBuf;

pub const CONFIG_ENV: &str = "CLI_FORGE_CONFIG";

/// CLI execution context containing the resolved configuration
#[derive(Debug, Clone)]
pub struct CliContext {
    pub config_path: Option<PathBuf>,
    pub config: CliConfig,
}

impl CliContext {
    /// Build the context from the process environment
    pub fn from_env() -> Result<Self> {
        Self::new(std::env::var_os(CONFIG_ENV).map(PathBuf::from))
    }

    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = match &config_path {
            Some(path) => CliConfig::load(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => {
                let mut config = CliConfig::new("cli-forge", env!("CARGO_PKG_VERSION"));
                config.log_level = "warn".to_string();
                config
            }
        };
        // the binary always reports failures through its exit code
        config.test_mode = false;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Initialize logging subsystem based on the configured level
    ///
    /// `RUST_LOG` directives are honored on top of the configured level.
    /// Log output goes to stderr so command output on stdout stays clean.
    pub fn init_logging(&self) {
        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
            self.config
                .log_level
                .parse()
                .unwrap_or_else(|_| tracing::Level::WARN.into()),
        );

        // a subscriber may already be installed when embedded
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();

        tracing::debug!(config_path = ?self.config_path, "logging initialized");
    }
}
