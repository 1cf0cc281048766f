//! Demo plugin recording an audit trail of invocations

use async_trait::async_trait;
use cli_forge::{AppError, AppResult, Plugin, PluginContext, Toolbox};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Numbers every invocation and logs its outcome
#[derive(Debug, Default)]
pub struct AuditPlugin {
    invocations: AtomicU64,
}

#[async_trait]
impl Plugin for AuditPlugin {
    fn name(&self) -> &str {
        "audit"
    }

    async fn init(&self, context: &PluginContext) -> AppResult<()> {
        debug!(cli = %context.cli_name, version = %context.cli_version, "audit plugin ready");
        Ok(())
    }

    async fn execute(&self, toolbox: &mut Toolbox) -> AppResult<()> {
        let invocation = self.invocations.fetch_add(1, Ordering::SeqCst) + 1;
        toolbox.set_extension("invocation", json!(invocation));
        Ok(())
    }

    async fn after_command(&self, toolbox: &mut Toolbox, _result: &Value) -> AppResult<()> {
        info!(
            command = %toolbox.command_name,
            invocation = ?toolbox.extension("invocation"),
            "command completed"
        );
        Ok(())
    }

    async fn on_error(&self, error: &AppError, toolbox: Option<&Toolbox>) -> AppResult<()> {
        warn!(
            command = toolbox.map(|t| t.command_name.as_str()).unwrap_or("<unresolved>"),
            category = error.category(),
            "command failed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invocations_are_numbered() {
        let config = cli_forge::CliConfig::new("audit-test", "0.0.1").with_test_mode(true);
        let mut cli = cli_forge::Cli::new(config).unwrap();
        cli.add_command(
            cli_forge::Command::new("count").execute(|toolbox| async move {
                Ok(toolbox.extension("invocation").cloned().unwrap_or_default())
            }),
        )
        .unwrap();
        cli.add_plugin(AuditPlugin::default()).unwrap();
        let cli = cli.into_shared();

        let first = cli.run(["count"], Default::default()).await.unwrap();
        let second = cli.run(["count"], Default::default()).await.unwrap();
        assert_eq!(first, json!(1));
        assert_eq!(second, json!(2));
    }
}
