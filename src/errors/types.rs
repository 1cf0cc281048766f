//! Error types for the command engine
//!
//! This module defines every error that can surface while registering
//! commands and plugins, resolving argv, validating options and executing
//! command handlers.

use std::path::PathBuf;
use thiserror::Error;

/// A token the tokenizer could not match against any declared option,
/// together with near-miss option names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownToken {
    pub token: String,
    pub suggestions: Vec<String>,
}

/// Main application error type
///
/// Organized by the phase in which the error is raised: registration
/// errors are raised while the CLI is being built, everything else while
/// a command is being resolved or executed.
#[derive(Error, Debug)]
pub enum AppError {
    // Registration errors
    #[error("Command \"{key}\" is already registered")]
    DuplicateCommand {
        key: String,
    },

    #[error(
        "Invalid name \"{name}\": names must start with a letter and contain only \
         letters, digits, '_' or '-'"
    )]
    InvalidName {
        name: String,
    },

    #[error("Invalid definition for option \"{option}\": {reason}")]
    InvalidOptionDefinition {
        option: String,
        reason: String,
    },

    #[error("Plugin \"{name}\" is already registered")]
    DuplicatePlugin {
        name: String,
    },

    #[error("Cannot register plugin \"{name}\": plugins are already initialized")]
    PluginRegistrationClosed {
        name: String,
    },

    #[error("Plugins are already initialized")]
    PluginsAlreadyInitialized,

    #[error("Circular plugin dependency detected at \"{plugin}\"")]
    CircularDependency {
        plugin: String,
    },

    #[error("Plugin \"{plugin}\" depends on \"{dependency}\", which is not registered")]
    MissingDependency {
        plugin: String,
        dependency: String,
    },

    // Resolution errors
    #[error("Command \"{name}\" not found{}", format_suggestions(.suggestions))]
    CommandNotFound {
        name: String,
        suggestions: Vec<String>,
    },

    // Validation errors
    #[error("Missing required option(s) for command \"{command}\": {}", format_flags(.missing))]
    CommandValidation {
        command: String,
        missing: Vec<String>,
    },

    #[error("Found unknown option(s) for command \"{command}\": {}", format_unknown(.tokens))]
    UnknownOption {
        command: String,
        tokens: Vec<UnknownToken>,
    },

    #[error("Options \"--{first}\" and \"--{second}\" cannot be used together")]
    ConflictingOptions {
        first: String,
        second: String,
    },

    #[error("Command \"{command}\" takes a single <{argument}> value, got: {}", .values.join(", "))]
    TooManyArguments {
        command: String,
        argument: String,
        values: Vec<String>,
    },

    #[error("Invalid value \"{value}\" for option \"{option}\": {reason}")]
    InvalidOptionValue {
        option: String,
        value: String,
        reason: String,
    },

    // Execution errors
    #[error("Plugin \"{plugin}\" failed during {hook}: {message}")]
    Plugin {
        plugin: String,
        hook: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Plugins failed to initialize: {message}")]
    PluginInitFailed {
        message: String,
    },

    #[error("Command \"{command}\" has no function to execute")]
    NoExecuteFunction {
        command: String,
    },

    #[error("Command \"{command}\" failed: {message}")]
    CommandFailed {
        command: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("TOML parsing error: {context}")]
    TomlParsing {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("File I/O error for '{path}': {operation}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Generic/catch-all errors
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{message}")]
    Other {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(". Did you mean: {}?", suggestions.join(", "))
    }
}

fn format_flags(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("--{name}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_unknown(tokens: &[UnknownToken]) -> String {
    tokens
        .iter()
        .map(|unknown| {
            if unknown.suggestions.is_empty() {
                unknown.token.clone()
            } else {
                let hints: Vec<String> =
                    unknown.suggestions.iter().map(|s| format!("--{s}")).collect();
                format!("{} (did you mean {}?)", unknown.token, hints.join(", "))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl AppError {
    /// Create a new Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new Config error with source
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new I/O error with source
    pub fn io_with_source(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Io {
            path: path.into(),
            operation: operation.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Wrap a failure raised by a plugin hook
    pub fn plugin(plugin: impl Into<String>, hook: impl Into<String>, cause: AppError) -> Self {
        Self::Plugin {
            plugin: plugin.into(),
            hook: hook.into(),
            message: cause.to_string(),
            source: Some(Box::new(cause)),
        }
    }

    /// Create a failure for a command handler
    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create an invalid option definition error
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOptionDefinition {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid option value error
    pub fn invalid_value(
        option: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidOptionValue {
            option: option.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::DuplicateCommand { .. }
            | Self::InvalidName { .. }
            | Self::InvalidOptionDefinition { .. }
            | Self::DuplicatePlugin { .. }
            | Self::PluginRegistrationClosed { .. }
            | Self::PluginsAlreadyInitialized
            | Self::CircularDependency { .. }
            | Self::MissingDependency { .. } => "registration",
            Self::CommandNotFound { .. } => "resolution",
            Self::CommandValidation { .. }
            | Self::UnknownOption { .. }
            | Self::ConflictingOptions { .. }
            | Self::TooManyArguments { .. }
            | Self::InvalidOptionValue { .. } => "validation",
            Self::Plugin { .. } | Self::PluginInitFailed { .. } => "plugin",
            Self::NoExecuteFunction { .. } | Self::CommandFailed { .. } => "execution",
            Self::Config { .. } | Self::TomlParsing { .. } => "config",
            Self::Io { .. } => "io",
            Self::Internal { .. } | Self::Other { .. } => "internal",
        }
    }

    /// Whether the error was raised while the CLI was being built
    pub fn is_registration_error(&self) -> bool {
        self.category() == "registration"
    }

    /// Process exit code reported for this error
    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        let operation = match err.kind() {
            std::io::ErrorKind::NotFound => "file not found",
            std::io::ErrorKind::PermissionDenied => "permission denied",
            _ => "I/O operation",
        }
        .to_string();

        Self::Io {
            path: PathBuf::from("unknown"),
            operation,
            source: Some(Box::new(err)),
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::TomlParsing {
            context: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Other {
            message: format!("JSON error: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_not_found_lists_suggestions() {
        let err = AppError::CommandNotFound {
            name: "biuld".to_string(),
            suggestions: vec!["build".to_string()],
        };
        assert_eq!(err.to_string(), "Command \"biuld\" not found. Did you mean: build?");

        let err = AppError::CommandNotFound {
            name: "zzz".to_string(),
            suggestions: vec![],
        };
        assert_eq!(err.to_string(), "Command \"zzz\" not found");
    }

    #[test]
    fn test_validation_message_names_all_missing() {
        let err = AppError::CommandValidation {
            command: "build".to_string(),
            missing: vec!["target".to_string(), "out-dir".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required option(s) for command \"build\": --target, --out-dir"
        );
    }

    #[test]
    fn test_unknown_option_annotation() {
        let err = AppError::UnknownOption {
            command: "build".to_string(),
            tokens: vec![
                UnknownToken {
                    token: "--prod".to_string(),
                    suggestions: vec!["production".to_string()],
                },
                UnknownToken {
                    token: "-x".to_string(),
                    suggestions: vec![],
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "Found unknown option(s) for command \"build\": --prod (did you mean --production?), -x"
        );
    }

    #[test]
    fn test_too_many_arguments_lists_values() {
        let err = AppError::TooManyArguments {
            command: "open".to_string(),
            argument: "file".to_string(),
            values: vec!["a.txt".to_string(), "b.txt".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Command \"open\" takes a single <file> value, got: a.txt, b.txt"
        );
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn test_error_category() {
        assert_eq!(AppError::DuplicateCommand { key: "a".into() }.category(), "registration");
        assert_eq!(AppError::config("x").category(), "config");
        assert!(AppError::CircularDependency { plugin: "p".into() }.is_registration_error());
        assert!(!AppError::NoExecuteFunction { command: "c".into() }.is_registration_error());
    }

    #[test]
    fn test_plugin_error_keeps_cause() {
        let cause = AppError::internal("boom");
        let err = AppError::plugin("audit", "before_command", cause);
        assert_eq!(
            err.to_string(),
            "Plugin \"audit\" failed during before_command: Internal error: boom"
        );
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.exit_code(), 1);
    }
}
