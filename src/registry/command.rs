//! Command descriptors
//!
//! [`Command`] is the builder callers hand to `Cli::add_command`.
//! Registration compiles it into an immutable [`CompiledCommand`].

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::errors::AppResult;
use crate::options::validator::{conflicting_option_names, required_option_names};
use crate::options::{
    compile_options, ArgumentDefinition, CompiledOption, EnvDefinition, OptionDefinition,
};
use crate::runtime::Toolbox;

/// The body of a command
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(&self, toolbox: Toolbox) -> AppResult<Value>;
}

/// Adapter turning an async closure into a [`CommandHandler`]
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(Toolbox) -> Fut + Send + Sync,
    Fut: Future<Output = AppResult<Value>> + Send,
{
    async fn execute(&self, toolbox: Toolbox) -> AppResult<Value> {
        (self.0)(toolbox).await
    }
}

/// Builder for a command declaration
#[derive(Clone, Default)]
pub struct Command {
    pub name: String,
    pub aliases: Vec<String>,
    pub command_path: Vec<String>,
    pub description: Option<String>,
    pub options: Vec<OptionDefinition>,
    pub argument: Option<ArgumentDefinition>,
    pub env: Vec<EnvDefinition>,
    pub handler: Option<Arc<dyn CommandHandler>>,
    pub hidden: bool,
    pub group: Option<String>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("command_path", &self.command_path)
            .field("aliases", &self.aliases)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Nest the command under parent segments, e.g. `["deploy"]` for
    /// `deploy staging`
    pub fn path<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command_path = segments.into_iter().map(Into::into).collect();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn option(mut self, option: OptionDefinition) -> Self {
        self.options.push(option);
        self
    }

    pub fn argument(mut self, argument: ArgumentDefinition) -> Self {
        self.argument = Some(argument);
        self
    }

    pub fn env(mut self, env: EnvDefinition) -> Self {
        self.env.push(env);
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn handler(mut self, handler: impl CommandHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Use an async closure as the command body
    pub fn execute<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Toolbox) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Value>> + Send + 'static,
    {
        self.handler(FnHandler(f))
    }

    /// Registry key: path segments and name joined by spaces
    pub fn key(&self) -> String {
        command_key(&self.command_path, &self.name)
    }
}

pub(crate) fn command_key(path: &[String], name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{} {}", path.join(" "), name)
    }
}

/// A registered command with its options compiled
pub struct CompiledCommand {
    pub name: String,
    pub aliases: Vec<String>,
    pub command_path: Vec<String>,
    pub key: String,
    pub description: Option<String>,
    pub options: Vec<CompiledOption>,
    pub argument: Option<ArgumentDefinition>,
    pub env: Vec<EnvDefinition>,
    pub handler: Option<Arc<dyn CommandHandler>>,
    pub hidden: bool,
    pub group: Option<String>,
    /// Names of options declaring `required`
    pub required_options: Vec<String>,
    /// Names of options declaring `conflicts`
    pub conflicting_options: Vec<String>,
}

impl fmt::Debug for CompiledCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledCommand")
            .field("key", &self.key)
            .field("aliases", &self.aliases)
            .field("options", &self.options.iter().map(|o| o.name()).collect::<Vec<_>>())
            .field("required_options", &self.required_options)
            .field("conflicting_options", &self.conflicting_options)
            .finish()
    }
}

impl CompiledCommand {
    /// Compile a descriptor; the descriptor itself is left untouched
    pub fn compile(command: &Command) -> AppResult<Self> {
        let options = compile_options(&command.options)?;
        let required_options = required_option_names(&options);
        let conflicting_options = conflicting_option_names(&options);

        Ok(Self {
            name: command.name.clone(),
            aliases: command.aliases.clone(),
            command_path: command.command_path.clone(),
            key: command.key(),
            description: command.description.clone(),
            options,
            argument: command.argument.clone(),
            env: command.env.clone(),
            handler: command.handler.clone(),
            hidden: command.hidden,
            group: command.group.clone(),
            required_options,
            conflicting_options,
        })
    }

    /// Name including parent path, as a user would type it
    pub fn full_name(&self) -> &str {
        &self.key
    }
}
