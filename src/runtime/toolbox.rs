//! Per-invocation execution context

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::dispatcher::{Cli, RunCommandOptions};
use crate::errors::AppResult;
use crate::options::option_key;
use crate::registry::CompiledCommand;

/// Output level selected by the global `quiet`/`verbose`/`debug` options
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    Debug,
}

/// Logger handed to command handlers
///
/// Diagnostic methods emit `tracing` events tagged with the command;
/// [`Logger::print`] is for user-facing output.
#[derive(Debug, Clone)]
pub struct Logger {
    command: String,
    verbosity: Verbosity,
}

impl Logger {
    pub fn new(command: impl Into<String>, verbosity: Verbosity) -> Self {
        Self {
            command: command.into(),
            verbosity,
        }
    }

    /// Pick the verbosity from resolved toolbox options
    pub fn from_options(command: impl Into<String>, options: &IndexMap<String, Value>) -> Self {
        let enabled = |key: &str| options.get(key).and_then(Value::as_bool).unwrap_or(false);
        let verbosity = if enabled("quiet") {
            Verbosity::Quiet
        } else if enabled("debug") {
            Verbosity::Debug
        } else if enabled("verbose") {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        Self::new(command, verbosity)
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        debug!(command = %self.command, "{}", message.as_ref());
    }

    pub fn info(&self, message: impl AsRef<str>) {
        info!(command = %self.command, "{}", message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        warn!(command = %self.command, "{}", message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        error!(command = %self.command, "{}", message.as_ref());
    }

    /// Write a line to stdout unless running quiet
    pub fn print(&self, message: impl AsRef<str>) {
        if self.verbosity != Verbosity::Quiet {
            println!("{}", message.as_ref());
        }
    }

    /// Write a line to stdout only in verbose or debug mode
    pub fn detail(&self, message: impl AsRef<str>) {
        if self.verbosity >= Verbosity::Verbose {
            println!("{}", message.as_ref());
        }
    }
}

/// Handle back to the dispatcher for invoking other commands
#[derive(Clone)]
pub struct Runtime {
    cli: Arc<Cli>,
}

impl Runtime {
    pub(crate) fn new(cli: Arc<Cli>) -> Self {
        Self { cli }
    }

    /// Run another command by name (`"build"`, `"deploy staging"` or
    /// `"deploy.staging"`) and return its result
    pub async fn run_command(&self, name: &str, options: RunCommandOptions) -> AppResult<Value> {
        self.cli.run_command(name, options).await
    }

    pub fn cli(&self) -> &Arc<Cli> {
        &self.cli
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime").field("cli", &self.cli.config().name).finish()
    }
}

/// Execution context for one command invocation
#[derive(Debug, Clone)]
pub struct Toolbox {
    pub command: Arc<CompiledCommand>,
    pub command_name: String,
    /// Positional values
    pub argument: Vec<String>,
    /// Raw argv the invocation started from
    pub argv: Vec<String>,
    /// Resolved options keyed by camelCase identifier
    pub options: IndexMap<String, Value>,
    /// Resolved environment variables keyed by camelCase identifier
    pub env: IndexMap<String, Value>,
    pub logger: Logger,
    pub runtime: Runtime,
    /// Values attached by plugins
    pub extensions: HashMap<String, Value>,
}

impl Toolbox {
    /// Look up an option by name (`dry-run`) or key (`dryRun`)
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options
            .get(name)
            .or_else(|| self.options.get(&option_key(name)))
    }

    /// Boolean option value, `false` when absent
    pub fn flag(&self, name: &str) -> bool {
        self.option(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.option(name).and_then(Value::as_str)
    }

    pub fn env_var(&self, name: &str) -> Option<&Value> {
        self.env
            .get(name)
            .or_else(|| self.env.get(&option_key(&name.to_lowercase())))
    }

    pub fn extension(&self, name: &str) -> Option<&Value> {
        self.extensions.get(name)
    }

    pub fn set_extension(&mut self, name: impl Into<String>, value: Value) {
        self.extensions.insert(name.into(), value);
    }
}
