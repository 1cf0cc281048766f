//! Per-invocation option resolution
//!
//! The passes run in a fixed order:
//!
//! 1. merge the command's options over the global ones (see [`merge_options`])
//! 2. negated counterparts, already synthesized at registration
//! 3. pull `true`/`false`/`1`/`0` literals away from boolean flags
//! 4. tokenize what is left
//! 5. union the literals and extra options over the tokenizer output, then
//!    apply `no-` inversion and `implies`
//!
//! [`merge_options`]: super::compile::merge_options

use heck::ToLowerCamelCase;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use super::tokenizer::{find_by_alias, find_by_name, split_inline, tokenize, Tokenized};
use super::types::{parse_bool_literal, CompiledOption};
use super::ExtraOptions;
use crate::errors::AppResult;

/// Fully resolved options for one invocation
#[derive(Debug, Clone, Default)]
pub struct ResolvedOptions {
    /// Values keyed by option name
    pub values: IndexMap<String, Value>,
    /// Options supplied by the user, on argv or as extra options
    pub explicit: HashSet<String>,
    /// Options whose value came from their `no-` counterpart
    pub negated: HashSet<String>,
    pub positionals: Vec<String>,
    pub unknown: Vec<String>,
    /// Positional and unknown tokens together, in argv order
    pub operands: Vec<String>,
}

impl ResolvedOptions {
    /// The option holds a non-null value, supplied or defaulted
    pub fn has_value(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(|v| !v.is_null())
    }

    /// The user supplied the option and it holds a non-null value
    pub fn is_present(&self, name: &str) -> bool {
        self.explicit.contains(name) && self.has_value(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Values re-keyed by camelCase identifier for the toolbox
    pub fn to_toolbox_map(&self, options: &[CompiledOption]) -> IndexMap<String, Value> {
        self.values
            .iter()
            .map(|(name, value)| {
                let key = find_by_name(options, name)
                    .map(|o| o.key.clone())
                    .unwrap_or_else(|| name.to_lower_camel_case());
                (key, value.clone())
            })
            .collect()
    }
}

/// Run passes 3 to 5 over a command-local argv
pub fn resolve_options(
    argv: &[String],
    options: &[CompiledOption],
    extra: &ExtraOptions,
) -> AppResult<ResolvedOptions> {
    let (sanitized, literals) = extract_boolean_literals(argv, options);
    let tokenized = tokenize(&sanitized, options)?;
    Ok(post_merge(tokenized, literals, extra, options))
}

/// Remove boolean flags followed by a boolean literal from argv.
///
/// Returns the sanitized argv and the extracted values keyed by option name.
/// Both `--flag true` and `--flag=true` forms are handled; a boolean flag
/// followed by anything else is left for the tokenizer.
pub fn extract_boolean_literals(
    argv: &[String],
    options: &[CompiledOption],
) -> (Vec<String>, IndexMap<String, Value>) {
    let mut sanitized = Vec::with_capacity(argv.len());
    let mut literals = IndexMap::new();
    let mut index = 0;

    while index < argv.len() {
        let token = &argv[index];
        index += 1;

        if token == "--" {
            sanitized.extend(argv[index - 1..].iter().cloned());
            break;
        }

        let Some((option, inline)) = boolean_flag(token, options) else {
            sanitized.push(token.clone());
            continue;
        };

        match inline {
            Some(raw) => match parse_bool_literal(raw) {
                Some(value) => {
                    literals.insert(option.name().to_string(), Value::Bool(value));
                }
                None => sanitized.push(token.clone()),
            },
            None => match argv.get(index).and_then(|next| parse_bool_literal(next)) {
                Some(value) => {
                    debug!(option = option.name(), value, "extracted boolean literal");
                    literals.insert(option.name().to_string(), Value::Bool(value));
                    index += 1;
                }
                None => sanitized.push(token.clone()),
            },
        }
    }

    (sanitized, literals)
}

/// Match `--name[=v]` or `-alias[=v]` against the boolean options
fn boolean_flag<'a, 't>(
    token: &'t str,
    options: &'a [CompiledOption],
) -> Option<(&'a CompiledOption, Option<&'t str>)> {
    let (option, inline) = if let Some(body) = token.strip_prefix("--") {
        let (name, inline) = split_inline(body);
        (find_by_name(options, name)?, inline)
    } else if let Some(body) = token.strip_prefix('-') {
        let (alias, inline) = split_inline(body);
        (find_by_alias(options, alias)?, inline)
    } else {
        return None;
    };
    option.is_boolean().then_some((option, inline))
}

fn normalize_key(options: &[CompiledOption], key: &str) -> String {
    options
        .iter()
        .find(|o| o.name() == key || o.key == key)
        .map(|o| o.name().to_string())
        .unwrap_or_else(|| key.to_string())
}

/// Registration-time default, with booleans defaulting to `false`
fn effective_default(option: &CompiledOption) -> Option<Value> {
    match &option.definition.default_value {
        Some(value) => Some(value.clone()),
        None if option.is_boolean() => Some(Value::Bool(false)),
        None => None,
    }
}

fn post_merge(
    tokenized: Tokenized,
    literals: IndexMap<String, Value>,
    extra: &ExtraOptions,
    options: &[CompiledOption],
) -> ResolvedOptions {
    let Tokenized {
        mut values,
        mut explicit,
        positionals,
        unknown,
        operands,
    } = tokenized;

    for (name, value) in literals {
        explicit.insert(name.clone());
        values.insert(name, value);
    }
    for (key, value) in extra {
        let name = normalize_key(options, key);
        explicit.insert(name.clone());
        values.insert(name, value.clone());
    }

    // no-X supplied: X takes the inverted value
    let mut negated = HashSet::new();
    for option in options {
        let Some(positive) = option.name().strip_prefix("no-") else {
            continue;
        };
        if !explicit.contains(option.name()) || find_by_name(options, positive).is_none() {
            continue;
        }
        let value = values.get(option.name()).and_then(Value::as_bool).unwrap_or(false);
        values.insert(positive.to_string(), Value::Bool(!value));
        explicit.insert(positive.to_string());
        negated.insert(positive.to_string());
    }

    for option in options {
        if option.definition.implies.is_empty() || negated.contains(option.name()) {
            continue;
        }
        let Some(current) = values.get(option.name()).filter(|v| !v.is_null()) else {
            continue;
        };
        if Some(current) == effective_default(option).as_ref() {
            continue;
        }

        for (key, implied) in option.definition.implies.clone() {
            let target = normalize_key(options, &key);
            let user_value = explicit.contains(&target)
                && match find_by_name(options, &target) {
                    Some(target_option) => {
                        values.get(&target) != effective_default(target_option).as_ref()
                    }
                    None => true,
                };
            if user_value {
                continue;
            }
            debug!(option = option.name(), implied = %target, "applying implied value");
            values.insert(target, implied);
        }
    }

    ResolvedOptions {
        values,
        explicit,
        negated,
        positionals,
        unknown,
        operands,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::compile::compile_options;
    use crate::options::types::OptionDefinition;
    use serde_json::json;

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn resolve(tokens: &[&str], definitions: &[OptionDefinition]) -> ResolvedOptions {
        let options = compile_options(definitions).unwrap();
        resolve_options(&argv(tokens), &options, &ExtraOptions::new()).unwrap()
    }

    #[test]
    fn test_boolean_literal_is_extracted() {
        let resolved = resolve(
            &["--verbose", "true", "file.txt"],
            &[OptionDefinition::new("verbose").boolean()],
        );
        assert_eq!(resolved.values["verbose"], json!(true));
        assert_eq!(resolved.positionals, vec!["file.txt"]);
    }

    #[test]
    fn test_boolean_literal_forms() {
        let definitions = [
            OptionDefinition::new("verbose").boolean().alias("v"),
            OptionDefinition::new("cache").boolean().default_value(true),
        ];
        let resolved = resolve(&["-v", "0", "--cache=false"], &definitions);
        assert_eq!(resolved.values["verbose"], json!(false));
        assert_eq!(resolved.values["cache"], json!(false));
        assert!(resolved.is_present("verbose"));
        assert!(resolved.positionals.is_empty());
    }

    #[test]
    fn test_boolean_flag_followed_by_word_keeps_word_positional() {
        let definitions = [OptionDefinition::new("verbose").boolean()];
        let resolved = resolve(&["--verbose", "yes"], &definitions);
        assert_eq!(resolved.values["verbose"], json!(true));
        assert_eq!(resolved.positionals, vec!["yes"]);
    }

    #[test]
    fn test_extraction_leaves_string_values_alone() {
        let (sanitized, literals) = extract_boolean_literals(
            &argv(&["--name", "true", "--", "--force", "1"]),
            &compile_options(&[
                OptionDefinition::new("name"),
                OptionDefinition::new("force").boolean(),
            ])
            .unwrap(),
        );
        assert_eq!(sanitized, argv(&["--name", "true", "--", "--force", "1"]));
        assert!(literals.is_empty());
    }

    #[test]
    fn test_negation_inverts_counterpart() {
        let resolved = resolve(&["--no-color"], &[OptionDefinition::new("no-color").boolean()]);
        assert_eq!(resolved.values["color"], json!(false));
        assert!(resolved.negated.contains("color"));

        let resolved = resolve(&[], &[OptionDefinition::new("no-color").boolean()]);
        assert_eq!(resolved.values["color"], json!(true));
        assert!(resolved.negated.is_empty());
    }

    #[test]
    fn test_implies_sets_unsupplied_option() {
        let definitions = [
            OptionDefinition::new("production").boolean().implies("minify", true),
            OptionDefinition::new("minify").boolean(),
        ];
        let resolved = resolve(&["--production"], &definitions);
        assert_eq!(resolved.values["minify"], json!(true));

        let resolved = resolve(&[], &definitions);
        assert_eq!(resolved.values["minify"], json!(false));
    }

    #[test]
    fn test_implies_never_overrides_user_value() {
        let definitions = [
            OptionDefinition::new("production").boolean().implies("target", "release"),
            OptionDefinition::new("target").default_value("debug"),
        ];
        let resolved = resolve(&["--production", "--target", "profiling"], &definitions);
        assert_eq!(resolved.values["target"], json!("profiling"));

        // a supplied value equal to the default is still open to implication
        let resolved = resolve(&["--production", "--target", "debug"], &definitions);
        assert_eq!(resolved.values["target"], json!("release"));
    }

    #[test]
    fn test_negated_option_does_not_imply() {
        let definitions = [
            OptionDefinition::new("no-optimize").boolean().default_value(true),
            OptionDefinition::new("optimize").boolean().implies("minify", true),
            OptionDefinition::new("minify").boolean(),
        ];
        let resolved = resolve(&["--no-optimize=false"], &definitions);
        assert_eq!(resolved.values["optimize"], json!(true));
        assert_eq!(resolved.values["minify"], json!(false));
    }

    #[test]
    fn test_extra_options_count_as_supplied() {
        let options = compile_options(&[OptionDefinition::new("dry-run").boolean()]).unwrap();
        let mut extra = ExtraOptions::new();
        extra.insert("dryRun".to_string(), json!(true));

        let resolved = resolve_options(&[], &options, &extra).unwrap();
        assert_eq!(resolved.values["dry-run"], json!(true));
        assert!(resolved.is_present("dry-run"));
        assert_eq!(resolved.to_toolbox_map(&options)["dryRun"], json!(true));
    }
}
