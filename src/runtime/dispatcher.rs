//! Command dispatch
//!
//! [`Cli`] owns the command registry, the plugin manager and the global
//! options. Building a CLI takes `&mut self`; once built it is shared behind
//! an `Arc` so command handlers can call back into it through
//! [`Runtime`](super::Runtime).

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::builtins::{self, HELP_COMMAND, VERSION_COMMAND};
use super::env::{resolve_env, EnvSource};
use super::toolbox::{Logger, Runtime, Toolbox};
use crate::config::CliConfig;
use crate::errors::{AppError, AppResult};
use crate::options::validator::{conflicting_option_names, required_option_names};
use crate::options::{
    compile_options, merge_options, resolve_options, validate, CompiledOption, ExtraOptions,
    OptionDefinition, ResolvedOptions, ValidationRules,
};
use crate::plugins::{HookKind, Plugin, PluginContext, PluginManager};
use crate::registry::{Command, CommandHandler, CommandRegistry, CompiledCommand, Resolution};

/// Free-form text shown above and below the command listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSection {
    pub header: Option<String>,
    pub footer: Option<String>,
}

/// Arguments for a programmatic command invocation
#[derive(Debug, Clone, Default)]
pub struct RunCommandOptions {
    /// Command-local argv, without the command name
    pub argv: Vec<String>,
    pub options: ExtraOptions,
}

impl RunCommandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn argv<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv = argv.into_iter().map(Into::into).collect();
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Options every command accepts
pub fn default_global_options() -> Vec<OptionDefinition> {
    vec![
        OptionDefinition::new("help")
            .boolean()
            .alias("h")
            .description("Display help for the command"),
        OptionDefinition::new("version")
            .boolean()
            .alias("V")
            .description("Display the version"),
        OptionDefinition::new("verbose")
            .boolean()
            .alias("v")
            .description("Print more details"),
        OptionDefinition::new("debug")
            .boolean()
            .description("Print debugging details"),
        OptionDefinition::new("quiet")
            .boolean()
            .alias("q")
            .conflicts("verbose")
            .conflicts("debug")
            .description("Suppress output"),
    ]
}

/// A command-line interface: registered commands, plugins and the
/// dispatch logic tying them together
pub struct Cli {
    config: CliConfig,
    registry: CommandRegistry,
    plugins: PluginManager,
    global_definitions: Vec<OptionDefinition>,
    global_options: Vec<CompiledOption>,
    global_required: Vec<String>,
    global_conflicting: Vec<String>,
    default_command: Option<String>,
    command_section: CommandSection,
    env_source: EnvSource,
}

impl Cli {
    /// Create a CLI, registering the built-in commands when enabled
    pub fn new(config: CliConfig) -> AppResult<Self> {
        let mut cli = Self {
            registry: CommandRegistry::new(config.max_suggestions),
            plugins: PluginManager::new(),
            global_definitions: Vec::new(),
            global_options: Vec::new(),
            global_required: Vec::new(),
            global_conflicting: Vec::new(),
            default_command: config.default_command.clone(),
            command_section: CommandSection::default(),
            env_source: EnvSource::Process,
            config,
        };
        cli.set_global_options(default_global_options())?;

        if cli.config.builtin_commands {
            cli.add_command(builtins::help_command())?;
            cli.add_command(builtins::version_command())?;
            if cli.default_command.is_none() {
                cli.default_command = Some(HELP_COMMAND.to_string());
            }
        }
        Ok(cli)
    }

    pub fn config(&self) -> &CliConfig {
        &self.config
    }

    /// Register a command
    pub fn add_command(&mut self, command: Command) -> AppResult<Arc<CompiledCommand>> {
        self.registry.register(&command)
    }

    /// Register a plugin; fails once plugins have been initialized
    pub fn add_plugin(&mut self, plugin: impl Plugin + 'static) -> AppResult<()> {
        self.plugins.register(Arc::new(plugin))
    }

    /// Add an option accepted by every command
    pub fn add_global_option(&mut self, option: OptionDefinition) -> AppResult<()> {
        let mut definitions = self.global_definitions.clone();
        definitions.push(option);
        self.set_global_options(definitions)
    }

    fn set_global_options(&mut self, definitions: Vec<OptionDefinition>) -> AppResult<()> {
        let compiled = compile_options(&definitions)?;
        self.global_required = required_option_names(&compiled);
        self.global_conflicting = conflicting_option_names(&compiled);
        self.global_options = compiled;
        self.global_definitions = definitions;
        Ok(())
    }

    pub fn global_options(&self) -> &[CompiledOption] {
        &self.global_options
    }

    /// Command run when argv names no command
    pub fn set_default_command(&mut self, name: impl Into<String>) {
        self.default_command = Some(name.into());
    }

    pub fn default_command(&self) -> Option<&str> {
        self.default_command.as_deref()
    }

    /// Registered commands keyed by path and name, alias entries included
    pub fn commands(&self) -> &IndexMap<String, Arc<CompiledCommand>> {
        self.registry.commands()
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    pub fn command_section(&self) -> &CommandSection {
        &self.command_section
    }

    pub fn set_command_section(&mut self, section: CommandSection) {
        self.command_section = section;
    }

    /// Read declared environment variables from `source` instead of the
    /// process environment
    pub fn with_env_source(mut self, source: EnvSource) -> Self {
        self.env_source = source;
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Resolve and execute the command named by `argv`
    ///
    /// Failures go through the plugins' error handlers, then either
    /// terminate the process with a non-zero exit code or, in test mode,
    /// come back as `Err`.
    pub async fn run<I, S>(self: &Arc<Self>, argv: I, extra: ExtraOptions) -> AppResult<Value>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        info!(argv = ?argv, "dispatching");

        if let Err(e) = self.plugins.ensure_initialized(&self.plugin_context()).await {
            return self.fail(e, None).await;
        }

        let resolution = match self.resolve_argv(&argv) {
            Ok(resolution) => resolution,
            Err(e) => return self.fail(e, None).await,
        };

        let built = self.build_toolbox(resolution.command, &resolution.argv, argv.clone(), &extra);
        let mut toolbox = match built {
            Ok(toolbox) => toolbox,
            Err(e) => return self.fail(e, None).await,
        };

        match self.execute_with_hooks(&mut toolbox).await {
            Ok(result) => Ok(result),
            Err(e) => self.fail(e, Some(&toolbox)).await,
        }
    }

    /// Invoke another command by name from inside a running command
    ///
    /// The nested invocation gets its own toolbox and its own full
    /// resolution and validation pass. Errors are returned to the caller
    /// without running error handlers.
    pub async fn run_command(
        self: &Arc<Self>,
        name: &str,
        options: RunCommandOptions,
    ) -> AppResult<Value> {
        self.plugins.ensure_initialized(&self.plugin_context()).await?;

        let command = self.registry.resolve_name(name)?;
        info!(command = %command.key, argv = ?options.argv, "running nested command");

        let RunCommandOptions { argv, options } = options;
        let mut toolbox = self.build_toolbox(command, &argv, argv.clone(), &options)?;
        self.execute_with_hooks(&mut toolbox).await
    }

    fn plugin_context(&self) -> PluginContext {
        PluginContext {
            cli_name: self.config.name.clone(),
            cli_version: self.config.version.clone(),
        }
    }

    fn resolve_argv(&self, argv: &[String]) -> AppResult<Resolution> {
        let names_command = argv.first().is_some_and(|token| !token.starts_with('-'));
        if names_command {
            return self.registry.resolve(argv);
        }

        let Some(default) = &self.default_command else {
            return Err(AppError::CommandNotFound {
                name: String::new(),
                suggestions: Vec::new(),
            });
        };
        debug!(command = %default, "no command given, using default");
        let command = self.registry.resolve_name(default)?;
        Ok(Resolution {
            command,
            matched: default.clone(),
            argv: argv.to_vec(),
        })
    }

    fn build_toolbox(
        self: &Arc<Self>,
        command: Arc<CompiledCommand>,
        local_argv: &[String],
        raw_argv: Vec<String>,
        extra: &ExtraOptions,
    ) -> AppResult<Toolbox> {
        let options = merge_options(&[self.global_options.as_slice(), command.options.as_slice()]);
        let resolved = resolve_options(local_argv, &options, extra)?;

        // help and version output must stay reachable when validation would fail
        let substitute = self.builtin_substitute(&command.key, |flag| {
            resolved.get(flag).and_then(Value::as_bool).unwrap_or(false)
        });
        if substitute.is_none() {
            self.validate_invocation(&command, &options, &resolved)?;
        }

        let env = resolve_env(&command.env, &self.env_source)?;
        let option_map = resolved.to_toolbox_map(&options);

        let argument = if command.argument.is_some() {
            resolved.operands.clone()
        } else {
            resolved.positionals.clone()
        };

        Ok(Toolbox {
            command_name: command.key.clone(),
            logger: Logger::from_options(&command.key, &option_map),
            command,
            argument,
            argv: raw_argv,
            options: option_map,
            env,
            runtime: Runtime::new(Arc::clone(self)),
            extensions: HashMap::new(),
        })
    }

    fn validate_invocation(
        &self,
        command: &CompiledCommand,
        options: &[CompiledOption],
        resolved: &ResolvedOptions,
    ) -> AppResult<()> {
        let required: Vec<String> = self
            .global_required
            .iter()
            .chain(&command.required_options)
            .cloned()
            .collect();
        let conflicting: Vec<String> = self
            .global_conflicting
            .iter()
            .chain(&command.conflicting_options)
            .cloned()
            .collect();
        let rules = ValidationRules {
            command: &command.key,
            options,
            required_options: &required,
            conflicting_options: &conflicting,
            accepts_positionals: command.argument.is_some(),
        };
        validate(&rules, resolved)?;

        match &command.argument {
            Some(argument) if !argument.multiple && resolved.operands.len() > 1 => {
                Err(AppError::TooManyArguments {
                    command: command.key.clone(),
                    argument: argument.name.clone(),
                    values: resolved.operands.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Handler of the built-in `help`/`version` command when its flag is set
    fn builtin_substitute(
        &self,
        command_key: &str,
        is_set: impl Fn(&str) -> bool,
    ) -> Option<Arc<dyn CommandHandler>> {
        [("help", HELP_COMMAND), ("version", VERSION_COMMAND)]
            .into_iter()
            .filter(|(flag, designated)| is_set(flag) && command_key != *designated)
            .find_map(|(_, designated)| self.registry.get(designated)?.handler.clone())
    }

    /// The handler to run: `help`/`version` when requested, otherwise the
    /// command's own
    fn select_handler(&self, toolbox: &Toolbox) -> AppResult<Arc<dyn CommandHandler>> {
        let substitute = self.builtin_substitute(&toolbox.command.key, |flag| toolbox.flag(flag));
        if let Some(handler) = substitute {
            debug!(command = %toolbox.command_name, "substituting built-in handler");
            return Ok(handler);
        }

        toolbox
            .command
            .handler
            .clone()
            .ok_or_else(|| AppError::NoExecuteFunction {
                command: toolbox.command.key.clone(),
            })
    }

    async fn execute_with_hooks(&self, toolbox: &mut Toolbox) -> AppResult<Value> {
        let handler = self.select_handler(toolbox)?;

        self.plugins.execute_lifecycle(HookKind::Execute, toolbox, None).await?;
        self.plugins
            .execute_lifecycle(HookKind::BeforeCommand, toolbox, None)
            .await?;

        debug!(command = %toolbox.command_name, "executing command");
        let result = handler.execute(toolbox.clone()).await?;

        self.plugins
            .execute_lifecycle(HookKind::AfterCommand, toolbox, Some(&result))
            .await?;
        Ok(result)
    }

    async fn fail(&self, error: AppError, toolbox: Option<&Toolbox>) -> AppResult<Value> {
        self.plugins.execute_error_handlers(&error, toolbox).await;

        if self.config.test_mode {
            return Err(error);
        }

        error!(category = error.category(), error = %error, "command failed");
        eprintln!("Error: {error}");
        std::process::exit(error.exit_code());
    }
}
