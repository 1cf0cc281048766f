//! Invocation runtime: the dispatcher and the toolbox it hands to commands

pub mod builtins;
pub mod dispatcher;
pub mod env;
pub mod toolbox;

pub use dispatcher::{default_global_options, Cli, CommandSection, RunCommandOptions};
pub use env::EnvSource;
pub use toolbox::{Logger, Runtime, Toolbox, Verbosity};
