//! Plugin trait and hook identifiers

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::errors::{AppError, AppResult};
use crate::runtime::Toolbox;

/// Lifecycle hooks run around every command invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Init,
    /// Attach extension fields to the toolbox; runs before `BeforeCommand`
    Execute,
    BeforeCommand,
    AfterCommand,
    OnError,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Execute => "execute",
            Self::BeforeCommand => "before_command",
            Self::AfterCommand => "after_command",
            Self::OnError => "on_error",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Information handed to `Plugin::init`
#[derive(Debug, Clone)]
pub struct PluginContext {
    pub cli_name: String,
    pub cli_version: String,
}

/// A cross-cutting extension of the CLI
///
/// Every hook defaults to a no-op, so a plugin only implements the hooks
/// it cares about. Hooks of different plugins run one after another in
/// dependency order, never concurrently.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique plugin name
    fn name(&self) -> &str;

    /// Names of plugins whose hooks must run before this plugin's
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    async fn init(&self, _context: &PluginContext) -> AppResult<()> {
        Ok(())
    }

    async fn execute(&self, _toolbox: &mut Toolbox) -> AppResult<()> {
        Ok(())
    }

    async fn before_command(&self, _toolbox: &mut Toolbox) -> AppResult<()> {
        Ok(())
    }

    async fn after_command(&self, _toolbox: &mut Toolbox, _result: &Value) -> AppResult<()> {
        Ok(())
    }

    /// Observe a failed invocation; failures of this hook are logged and
    /// discarded
    async fn on_error(&self, _error: &AppError, _toolbox: Option<&Toolbox>) -> AppResult<()> {
        Ok(())
    }
}
