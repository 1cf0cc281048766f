//! Path-addressed command registry
//!
//! Commands are stored under their key (`"build"`, `"deploy staging"`),
//! with one extra entry per alias. A flat command and a nested command may
//! share a bare name because their keys differ.

pub mod command;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::suggest::find_alternatives;

pub use command::{Command, CommandHandler, CompiledCommand, FnHandler};
use command::command_key;

static NAME_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][\w-]*$").expect("valid name regex"));

/// Check a command name, alias or path segment against the naming rule
pub fn validate_name(name: &str) -> AppResult<()> {
    if NAME_RULE.is_match(name) {
        Ok(())
    } else {
        Err(AppError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// A command matched against argv
#[derive(Debug, Clone)]
pub struct Resolution {
    pub command: Arc<CompiledCommand>,
    /// The key or alias key that matched
    pub matched: String,
    /// Tokens left after the command path and name
    pub argv: Vec<String>,
}

/// Ordered mapping from command key to compiled command
#[derive(Debug)]
pub struct CommandRegistry {
    commands: IndexMap<String, Arc<CompiledCommand>>,
    /// Every registered parent path, joined by spaces
    paths: HashSet<String>,
    max_depth: usize,
    max_suggestions: usize,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new(3)
    }
}

impl CommandRegistry {
    pub fn new(max_suggestions: usize) -> Self {
        Self {
            commands: IndexMap::new(),
            paths: HashSet::new(),
            max_depth: 0,
            max_suggestions,
        }
    }

    /// Register a command and its aliases
    ///
    /// # Errors
    ///
    /// - `InvalidName` if the name, an alias or a path segment breaks the
    ///   naming rule
    /// - `DuplicateCommand` if the key or an alias key is already taken
    /// - `InvalidOptionDefinition` if an option cannot be compiled
    pub fn register(&mut self, command: &Command) -> AppResult<Arc<CompiledCommand>> {
        for segment in &command.command_path {
            validate_name(segment)?;
        }
        validate_name(&command.name)?;
        for alias in &command.aliases {
            validate_name(alias)?;
        }

        let key = command.key();
        let alias_keys: Vec<String> = command
            .aliases
            .iter()
            .map(|alias| command_key(&command.command_path, alias))
            .collect();

        let mut seen = HashSet::new();
        for candidate in std::iter::once(&key).chain(alias_keys.iter()) {
            if self.commands.contains_key(candidate) || !seen.insert(candidate.as_str()) {
                return Err(AppError::DuplicateCommand {
                    key: candidate.clone(),
                });
            }
        }

        let compiled = Arc::new(CompiledCommand::compile(command)?);
        debug!(command = %key, aliases = ?command.aliases, "registering command");

        self.commands.insert(key, Arc::clone(&compiled));
        for alias_key in alias_keys {
            self.commands.insert(alias_key, Arc::clone(&compiled));
        }
        for depth in 1..=command.command_path.len() {
            self.paths.insert(command.command_path[..depth].join(" "));
        }
        self.max_depth = self.max_depth.max(command.command_path.len());

        Ok(compiled)
    }

    /// All entries, alias keys included, in registration order
    pub fn commands(&self) -> &IndexMap<String, Arc<CompiledCommand>> {
        &self.commands
    }

    pub fn get(&self, key: &str) -> Option<&Arc<CompiledCommand>> {
        self.commands.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.commands.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Match the leading tokens of argv against registered commands,
    /// preferring the deepest path
    pub fn resolve(&self, tokens: &[String]) -> AppResult<Resolution> {
        let segments: Vec<&str> = tokens
            .iter()
            .take_while(|t| !t.starts_with('-'))
            .map(String::as_str)
            .collect();

        let deepest = segments.len().min(self.max_depth + 1);
        for depth in (1..=deepest).rev() {
            let key = segments[..depth].join(" ");
            if let Some(command) = self.commands.get(&key) {
                debug!(matched = %key, command = %command.key, "resolved command");
                return Ok(Resolution {
                    command: Arc::clone(command),
                    matched: key,
                    argv: tokens[depth..].to_vec(),
                });
            }
        }

        Err(self.not_found(&segments))
    }

    /// Look up a command by name, accepting `deploy.staging` or
    /// `deploy staging` for nested commands
    pub fn resolve_name(&self, name: &str) -> AppResult<Arc<CompiledCommand>> {
        let segments: Vec<&str> = name
            .split(|c: char| c == '.' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        self.commands
            .get(&segments.join(" "))
            .cloned()
            .ok_or_else(|| self.not_found(&segments))
    }

    fn not_found(&self, segments: &[&str]) -> AppError {
        if segments.is_empty() {
            return AppError::CommandNotFound {
                name: String::new(),
                suggestions: Vec::new(),
            };
        }

        // the deepest registered parent path decides which names to compare against
        let mut prefix_len = 0;
        for depth in (1..segments.len()).rev() {
            if self.paths.contains(&segments[..depth].join(" ")) {
                prefix_len = depth;
                break;
            }
        }
        let query_len = (prefix_len + 1).min(segments.len());
        let query = segments[..query_len].join(" ");

        let prefix = match prefix_len {
            0 => String::new(),
            _ => format!("{} ", segments[..prefix_len].join(" ")),
        };
        let siblings = self.commands.iter().filter(|(key, command)| {
            !command.hidden && key.split(' ').count() == prefix_len + 1 && key.starts_with(&prefix)
        });
        let mut suggestions = find_alternatives(&query, siblings.map(|(key, _)| key));
        suggestions.truncate(self.max_suggestions);

        AppError::CommandNotFound {
            name: query,
            suggestions,
        }
    }
}
