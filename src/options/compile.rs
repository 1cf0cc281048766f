//! Registration-time option processing
//!
//! Turns caller-owned [`OptionDefinition`] lists into [`CompiledOption`]
//! lists: definitions are checked, camelCase keys derived and negated
//! counterparts synthesized. Merging a command's options with the global
//! ones also lives here because it works on compiled options.

use heck::ToLowerCamelCase;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use super::types::{CompiledOption, OptionDefinition};
use crate::errors::{AppError, AppResult};

const NEGATION_PREFIX: &str = "no-";

/// camelCase lookup key for an option name (`dry-run` -> `dryRun`)
pub fn option_key(name: &str) -> String {
    name.to_lower_camel_case()
}

/// Check definitions, derive keys and synthesize negated counterparts
pub fn compile_options(definitions: &[OptionDefinition]) -> AppResult<Vec<CompiledOption>> {
    let mut compiled = Vec::with_capacity(definitions.len());

    for definition in definitions {
        validate_definition(definition)?;
        compiled.push(CompiledOption {
            key: option_key(&definition.name),
            definition: definition.clone(),
            synthesized: false,
        });
    }

    synthesize_negations(compiled)
}

fn validate_definition(definition: &OptionDefinition) -> AppResult<()> {
    if definition.name.is_empty() {
        return Err(AppError::invalid_option("", "option name cannot be empty"));
    }
    if definition.name.starts_with('-') {
        return Err(AppError::invalid_option(
            &definition.name,
            "option names are declared without leading dashes",
        ));
    }
    if definition.multiple && definition.lazy_multiple {
        return Err(AppError::invalid_option(
            &definition.name,
            "an option cannot be both multiple and lazy_multiple",
        ));
    }
    if definition.option_type.is_boolean() && (definition.multiple || definition.lazy_multiple) {
        return Err(AppError::invalid_option(
            &definition.name,
            "boolean options cannot take multiple values",
        ));
    }
    Ok(())
}

/// Append `X` for every boolean `no-X` option that lacks one.
///
/// Running this over its own output changes nothing.
pub fn synthesize_negations(mut options: Vec<CompiledOption>) -> AppResult<Vec<CompiledOption>> {
    let mut additions = Vec::new();

    for option in &options {
        let Some(positive) = option.name().strip_prefix(NEGATION_PREFIX) else {
            continue;
        };
        if positive.is_empty() {
            continue;
        }
        if !option.is_boolean() {
            return Err(AppError::invalid_option(
                option.name(),
                "only boolean options can have a negated counterpart",
            ));
        }
        let exists = options.iter().any(|o| o.name() == positive)
            || additions.iter().any(|o: &CompiledOption| o.name() == positive);
        if exists {
            continue;
        }

        let negated_default = match &option.definition.default_value {
            Some(Value::Bool(value)) => !value,
            _ => true,
        };
        debug!(option = option.name(), counterpart = positive, "synthesizing negated counterpart");

        let mut definition = OptionDefinition::new(positive)
            .boolean()
            .default_value(negated_default)
            .hidden();
        definition.description = option.definition.description.clone();

        additions.push(CompiledOption {
            key: option_key(positive),
            definition,
            synthesized: true,
        });
    }

    options.extend(additions);
    Ok(options)
}

/// Combine option lists by name; later lists override earlier entries
/// while keeping the position where a name was first seen
pub fn merge_options(layers: &[&[CompiledOption]]) -> Vec<CompiledOption> {
    let mut merged: IndexMap<String, CompiledOption> = IndexMap::new();
    for layer in layers {
        for option in layer.iter() {
            merged.insert(option.name().to_string(), option.clone());
        }
    }
    merged.into_values().collect()
}
