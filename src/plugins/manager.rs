//! Plugin registration and lifecycle execution
//!
//! Plugins are kept in registration order. The dependency order is computed
//! on first use, cached, and dropped again when another plugin registers.
//! The dispatcher initializes plugins through [`PluginManager::ensure_initialized`],
//! which runs the `init` hooks once and remembers whether they succeeded.

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use super::types::{HookKind, Plugin, PluginContext};
use crate::errors::{AppError, AppResult};
use crate::runtime::Toolbox;

/// Owns the registered plugins and runs their hooks
#[derive(Default)]
pub struct PluginManager {
    plugins: IndexMap<String, Arc<dyn Plugin>>,
    order: OnceCell<Vec<Arc<dyn Plugin>>>,
    initialized: AtomicBool,
    /// Outcome of the init run, failure message included
    init_outcome: tokio::sync::OnceCell<Result<(), String>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin
    ///
    /// # Errors
    ///
    /// Fails with `PluginRegistrationClosed` once `init` has run and with
    /// `DuplicatePlugin` if the name is taken.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> AppResult<()> {
        let name = plugin.name().to_string();
        if self.is_initialized() {
            return Err(AppError::PluginRegistrationClosed { name });
        }
        if self.plugins.contains_key(&name) {
            return Err(AppError::DuplicatePlugin { name });
        }

        debug!(plugin = %name, "registering plugin");
        self.plugins.insert(name, plugin);
        self.order = OnceCell::new();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Names of all plugins in dependency order
    pub fn dependency_order(&self) -> AppResult<Vec<String>> {
        Ok(self.ordered()?.iter().map(|p| p.name().to_string()).collect())
    }

    fn ordered(&self) -> AppResult<&Vec<Arc<dyn Plugin>>> {
        self.order.get_or_try_init(|| {
            let mut visiting = HashSet::new();
            let mut visited = HashSet::new();
            let mut order: Vec<Arc<dyn Plugin>> = Vec::with_capacity(self.plugins.len());
            for name in self.plugins.keys() {
                self.visit(name, &mut visiting, &mut visited, &mut order)?;
            }
            let names: Vec<String> = order.iter().map(|p| p.name().to_string()).collect();
            debug!(order = ?names, "computed plugin order");
            Ok(order)
        })
    }

    fn visit(
        &self,
        name: &str,
        visiting: &mut HashSet<String>,
        visited: &mut HashSet<String>,
        order: &mut Vec<Arc<dyn Plugin>>,
    ) -> AppResult<()> {
        if visited.contains(name) {
            return Ok(());
        }
        if !visiting.insert(name.to_string()) {
            return Err(AppError::CircularDependency {
                plugin: name.to_string(),
            });
        }

        let plugin = self
            .plugins
            .get(name)
            .ok_or_else(|| {
                AppError::internal(format!("plugin \"{name}\" vanished during ordering"))
            })?;
        for dependency in plugin.dependencies() {
            if !self.plugins.contains_key(&dependency) {
                return Err(AppError::MissingDependency {
                    plugin: name.to_string(),
                    dependency,
                });
            }
            self.visit(&dependency, visiting, visited, order)?;
        }

        visiting.remove(name);
        visited.insert(name.to_string());
        order.push(Arc::clone(plugin));
        Ok(())
    }

    /// Run every plugin's `init` hook; may only happen once
    pub async fn init(&self, context: &PluginContext) -> AppResult<()> {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AppError::PluginsAlreadyInitialized);
        }

        for plugin in self.ordered()? {
            debug!(plugin = plugin.name(), "initializing plugin");
            plugin
                .init(context)
                .await
                .map_err(|e| AppError::plugin(plugin.name(), HookKind::Init.as_str(), e))?;
        }
        Ok(())
    }

    /// Initialize plugins unless that already happened
    ///
    /// Concurrent callers wait for the same init run. The caller that runs
    /// it gets the original error on failure; every later call fails with
    /// `PluginInitFailed`, so hooks never run on uninitialized plugins.
    pub async fn ensure_initialized(&self, context: &PluginContext) -> AppResult<()> {
        let mut failure = None;
        let slot = &mut failure;
        let outcome = self
            .init_outcome
            .get_or_init(|| async move {
                match self.init(context).await {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        let message = e.to_string();
                        *slot = Some(e);
                        Err(message)
                    }
                }
            })
            .await;

        if let Some(e) = failure {
            return Err(e);
        }
        outcome
            .clone()
            .map_err(|message| AppError::PluginInitFailed { message })
    }

    /// Run one toolbox hook on every plugin in dependency order, stopping
    /// at the first failure
    pub async fn execute_lifecycle(
        &self,
        hook: HookKind,
        toolbox: &mut Toolbox,
        result: Option<&Value>,
    ) -> AppResult<()> {
        let null = Value::Null;
        for plugin in self.ordered()? {
            let outcome = match hook {
                HookKind::Execute => plugin.execute(toolbox).await,
                HookKind::BeforeCommand => plugin.before_command(toolbox).await,
                HookKind::AfterCommand => {
                    plugin.after_command(toolbox, result.unwrap_or(&null)).await
                }
                HookKind::Init | HookKind::OnError => {
                    return Err(AppError::internal(format!(
                        "{hook} is not a toolbox lifecycle hook"
                    )))
                }
            };
            outcome.map_err(|e| AppError::plugin(plugin.name(), hook.as_str(), e))?;
        }
        Ok(())
    }

    /// Hand an error to every plugin's `on_error` hook.
    ///
    /// Handler failures are logged and swallowed.
    pub async fn execute_error_handlers(&self, error: &AppError, toolbox: Option<&Toolbox>) {
        let plugins = match self.ordered() {
            Ok(plugins) => plugins,
            Err(order_error) => {
                warn!(error = %order_error, "cannot run error handlers");
                return;
            }
        };

        for plugin in plugins {
            if let Err(handler_error) = plugin.on_error(error, toolbox).await {
                warn!(
                    plugin = plugin.name(),
                    error = %handler_error,
                    "plugin error handler failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorder {
        name: String,
        dependencies: Vec<String>,
        log: Arc<Mutex<Vec<String>>>,
        fail_init: bool,
        fail_on_error: bool,
    }

    impl Recorder {
        fn new(name: &str, dependencies: &[&str], log: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name: name.to_string(),
                dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
                log: Arc::clone(log),
                fail_init: false,
                fail_on_error: false,
            }
        }
    }

    #[async_trait]
    impl Plugin for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn dependencies(&self) -> Vec<String> {
            self.dependencies.clone()
        }

        async fn init(&self, _context: &PluginContext) -> AppResult<()> {
            self.log.lock().unwrap().push(format!("init:{}", self.name));
            if self.fail_init {
                return Err(AppError::internal("init failed"));
            }
            Ok(())
        }

        async fn on_error(&self, _error: &AppError, _toolbox: Option<&Toolbox>) -> AppResult<()> {
            self.log.lock().unwrap().push(format!("on_error:{}", self.name));
            if self.fail_on_error {
                return Err(AppError::internal("handler broke"));
            }
            Ok(())
        }
    }

    fn context() -> PluginContext {
        PluginContext {
            cli_name: "test".to_string(),
            cli_version: "0.0.0".to_string(),
        }
    }

    fn manager_with(plugins: Vec<Recorder>) -> PluginManager {
        let mut manager = PluginManager::new();
        for plugin in plugins {
            manager.register(Arc::new(plugin)).unwrap();
        }
        manager
    }

    #[test]
    fn test_order_follows_dependencies_not_registration() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = manager_with(vec![
            Recorder::new("c", &["b"], &log),
            Recorder::new("b", &["a"], &log),
            Recorder::new("a", &[], &log),
        ]);
        assert_eq!(manager.dependency_order().unwrap(), vec!["a", "b", "c"]);

        let manager = manager_with(vec![
            Recorder::new("a", &[], &log),
            Recorder::new("b", &["a"], &log),
            Recorder::new("c", &["b"], &log),
        ]);
        assert_eq!(manager.dependency_order().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cycle_is_detected_at_first_plugin() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = manager_with(vec![
            Recorder::new("p1", &["p2"], &log),
            Recorder::new("p2", &["p1"], &log),
        ]);
        let err = manager.dependency_order().unwrap_err();
        assert!(matches!(err, AppError::CircularDependency { plugin } if plugin == "p1"));
    }

    #[test]
    fn test_missing_dependency() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = manager_with(vec![Recorder::new("auth", &["session"], &log)]);
        let err = manager.dependency_order().unwrap_err();
        assert!(matches!(
            err,
            AppError::MissingDependency { plugin, dependency }
                if plugin == "auth" && dependency == "session"
        ));
    }

    #[test]
    fn test_duplicate_plugin_name() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = manager_with(vec![Recorder::new("a", &[], &log)]);
        let err = manager.register(Arc::new(Recorder::new("a", &[], &log))).unwrap_err();
        assert!(matches!(err, AppError::DuplicatePlugin { .. }));
    }

    #[test]
    fn test_registration_invalidates_cached_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = manager_with(vec![Recorder::new("b", &[], &log)]);
        assert_eq!(manager.dependency_order().unwrap(), vec!["b"]);
        manager.register(Arc::new(Recorder::new("a", &[], &log))).unwrap();
        assert_eq!(manager.dependency_order().unwrap(), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_init_runs_in_order_and_only_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = manager_with(vec![
            Recorder::new("b", &["a"], &log),
            Recorder::new("a", &[], &log),
        ]);

        manager.init(&context()).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["init:a", "init:b"]);

        let err = manager.init(&context()).await.unwrap_err();
        assert!(matches!(err, AppError::PluginsAlreadyInitialized));

        let err = manager.register(Arc::new(Recorder::new("late", &[], &log))).unwrap_err();
        assert!(matches!(err, AppError::PluginRegistrationClosed { .. }));
    }

    #[tokio::test]
    async fn test_init_failure_is_wrapped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut failing = Recorder::new("db", &[], &log);
        failing.fail_init = true;
        let manager = manager_with(vec![failing]);

        let err = manager.init(&context()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Plugin { plugin, hook, .. } if plugin == "db" && hook == "init"
        ));
    }

    #[tokio::test]
    async fn test_failed_init_is_remembered() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut failing = Recorder::new("db", &[], &log);
        failing.fail_init = true;
        let manager = manager_with(vec![failing]);

        let err = manager.ensure_initialized(&context()).await.unwrap_err();
        assert!(matches!(err, AppError::Plugin { .. }));

        let err = manager.ensure_initialized(&context()).await.unwrap_err();
        assert!(matches!(err, AppError::PluginInitFailed { message } if message.contains("db")));
        assert_eq!(*log.lock().unwrap(), vec!["init:db"]);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_init() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = manager_with(vec![Recorder::new("a", &[], &log)]);

        let (ctx_a, ctx_b) = (context(), context());
        let (first, second) = tokio::join!(
            manager.ensure_initialized(&ctx_a),
            manager.ensure_initialized(&ctx_b),
        );
        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(*log.lock().unwrap(), vec!["init:a"]);
        assert!(manager.ensure_initialized(&context()).await.is_ok());
    }

    #[tokio::test]
    async fn test_error_handlers_swallow_failures() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut broken = Recorder::new("a", &[], &log);
        broken.fail_on_error = true;
        let manager = manager_with(vec![Recorder::new("b", &["a"], &log), broken]);

        manager
            .execute_error_handlers(&AppError::internal("original"), None)
            .await;
        assert_eq!(*log.lock().unwrap(), vec!["on_error:a", "on_error:b"]);
    }
}
