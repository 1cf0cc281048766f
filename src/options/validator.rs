//! Post-resolution option validation
//!
//! Checks run in a fixed order and the first failing check aborts the
//! invocation: required options, unknown tokens, then conflicts.

use super::pipeline::ResolvedOptions;
use super::tokenizer::{find_by_name, split_inline};
use super::types::CompiledOption;
use crate::errors::{AppError, AppResult, UnknownToken};
use crate::suggest::find_alternatives;

/// Validation inputs for one invocation
#[derive(Debug, Clone, Copy)]
pub struct ValidationRules<'a> {
    pub command: &'a str,
    /// Merged option list the values were resolved against
    pub options: &'a [CompiledOption],
    /// Names of options declaring `required`
    pub required_options: &'a [String],
    /// Names of options declaring `conflicts`
    pub conflicting_options: &'a [String],
    /// The command declares a positional argument slot
    pub accepts_positionals: bool,
}

/// Run all checks against resolved options
pub fn validate(rules: &ValidationRules<'_>, resolved: &ResolvedOptions) -> AppResult<()> {
    check_required(rules, resolved)?;
    check_unknown(rules, resolved)?;
    check_conflicts(rules, resolved)
}

fn check_required(rules: &ValidationRules<'_>, resolved: &ResolvedOptions) -> AppResult<()> {
    let mut missing: Vec<String> = Vec::new();
    for name in rules.required_options {
        if !resolved.has_value(name) && !missing.contains(name) {
            missing.push(name.clone());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::CommandValidation {
            command: rules.command.to_string(),
            missing,
        })
    }
}

fn check_unknown(rules: &ValidationRules<'_>, resolved: &ResolvedOptions) -> AppResult<()> {
    if rules.accepts_positionals || resolved.unknown.is_empty() {
        return Ok(());
    }

    let visible: Vec<&str> = rules
        .options
        .iter()
        .filter(|o| !o.definition.hidden)
        .map(|o| o.name())
        .collect();

    let tokens = resolved
        .unknown
        .iter()
        .map(|token| {
            let suggestions = match token.strip_prefix("--") {
                Some(body) => find_alternatives(split_inline(body).0, visible.iter()),
                None => Vec::new(),
            };
            UnknownToken {
                token: token.clone(),
                suggestions,
            }
        })
        .collect();

    Err(AppError::UnknownOption {
        command: rules.command.to_string(),
        tokens,
    })
}

fn check_conflicts(rules: &ValidationRules<'_>, resolved: &ResolvedOptions) -> AppResult<()> {
    for name in rules.conflicting_options {
        let Some(option) = find_by_name(rules.options, name) else {
            continue;
        };
        if !resolved.is_present(name) {
            continue;
        }
        let conflict = option
            .definition
            .conflicts
            .iter()
            .find(|other| resolved.is_present(other));
        if let Some(other) = conflict {
            return Err(AppError::ConflictingOptions {
                first: name.clone(),
                second: other.clone(),
            });
        }
    }
    Ok(())
}

/// Names of options that declare `required`
pub fn required_option_names(options: &[CompiledOption]) -> Vec<String> {
    options
        .iter()
        .filter(|o| o.definition.required)
        .map(|o| o.name().to_string())
        .collect()
}

/// Names of options that declare `conflicts`
pub fn conflicting_option_names(options: &[CompiledOption]) -> Vec<String> {
    options
        .iter()
        .filter(|o| !o.definition.conflicts.is_empty())
        .map(|o| o.name().to_string())
        .collect()
}
