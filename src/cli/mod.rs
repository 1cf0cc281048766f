//! The `cli-forge` binary: a small demo application assembled from the
//! library's commands, options and plugins

pub mod commands;
pub mod context;
pub mod plugins;

use anyhow::Result;
use cli_forge::ExtraOptions;

pub use context::CliContext;

/// Main CLI application
pub struct CliApp;

impl CliApp {
    /// Build the demo CLI and dispatch the process arguments
    pub async fn run() -> Result<()> {
        let context = CliContext::from_env()?;
        context.init_logging();

        let cli = commands::build_cli(context.config.clone())?.into_shared();
        cli.run(std::env::args().skip(1), ExtraOptions::new()).await?;
        Ok(())
    }
}
