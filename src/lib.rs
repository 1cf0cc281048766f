//! CLI Forge Library
//!
//! Building blocks for command-line applications: a command registry with
//! nested commands and aliases, a multi-pass option resolver, "did you mean"
//! suggestions, a plugin lifecycle and an async dispatcher tying them
//! together.
//!
//! ```no_run
//! use cli_forge::{Cli, CliConfig, Command, ExtraOptions, OptionDefinition};
//! use serde_json::json;
//!
//! # async fn demo() -> cli_forge::AppResult<()> {
//! let mut cli = Cli::new(CliConfig::new("acme", "1.0.0"))?;
//! cli.add_command(
//!     Command::new("build")
//!         .option(OptionDefinition::new("production").boolean().alias("p"))
//!         .execute(|toolbox| async move {
//!             Ok(json!({ "production": toolbox.flag("production") }))
//!         }),
//! )?;
//!
//! let cli = cli.into_shared();
//! let result = cli.run(["build", "-p"], ExtraOptions::new()).await?;
//! assert_eq!(result["production"], json!(true));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod options;
pub mod plugins;
pub mod registry;
pub mod runtime;
pub mod suggest;

// Re-export commonly used types for convenience
pub use config::CliConfig;
pub use errors::{AppError, AppResult, ErrorContextExt};
pub use options::{ArgumentDefinition, EnvDefinition, ExtraOptions, OptionDefinition, OptionType};
pub use plugins::{HookKind, Plugin, PluginContext, PluginManager};
pub use registry::{Command, CommandHandler, CommandRegistry, CompiledCommand};
pub use runtime::{
    Cli, CommandSection, EnvSource, Logger, RunCommandOptions, Runtime, Toolbox, Verbosity,
};
