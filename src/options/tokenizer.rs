//! Generic `--name value` / `-alias value` tokenizer
//!
//! Knows nothing about boolean literals following a flag; those are pulled
//! out of argv beforehand by the pipeline.

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashSet;

use super::types::CompiledOption;
use crate::errors::{AppError, AppResult};

/// Output of a tokenizer run
#[derive(Debug, Clone, Default)]
pub struct Tokenized {
    /// Option values keyed by option name, defaults included
    pub values: IndexMap<String, Value>,
    /// Names of options that appeared on argv
    pub explicit: HashSet<String>,
    pub positionals: Vec<String>,
    /// Flag-shaped tokens that matched no declared option
    pub unknown: Vec<String>,
    /// Positional and unknown tokens together, in argv order
    pub operands: Vec<String>,
}

impl Tokenized {
    fn record(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
        self.explicit.insert(name.to_string());
    }

    fn push_positional(&mut self, token: &str) {
        self.positionals.push(token.to_string());
        self.operands.push(token.to_string());
    }

    fn push_unknown(&mut self, token: &str) {
        self.unknown.push(token.to_string());
        self.operands.push(token.to_string());
    }

    fn append(&mut self, name: &str, mut values: Vec<Value>) {
        match self.values.get_mut(name) {
            Some(Value::Array(existing)) if self.explicit.contains(name) => {
                existing.append(&mut values)
            }
            _ => {
                self.values.insert(name.to_string(), Value::Array(values));
            }
        }
        self.explicit.insert(name.to_string());
    }
}

pub(crate) fn find_by_name<'a>(
    options: &'a [CompiledOption],
    name: &str,
) -> Option<&'a CompiledOption> {
    options.iter().find(|o| o.name() == name)
}

pub(crate) fn find_by_alias<'a>(
    options: &'a [CompiledOption],
    alias: &str,
) -> Option<&'a CompiledOption> {
    options.iter().find(|o| o.has_alias(alias))
}

/// Split `name=value` into its parts
pub(crate) fn split_inline(body: &str) -> (&str, Option<&str>) {
    match body.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (body, None),
    }
}

fn is_numeric(token: &str) -> bool {
    token.parse::<f64>().is_ok()
}

fn is_flag_like(token: &str) -> bool {
    token.starts_with('-') && token.len() > 1 && !is_numeric(token)
}

/// Tokenize `argv` against the given options
pub fn tokenize(argv: &[String], options: &[CompiledOption]) -> AppResult<Tokenized> {
    let mut out = Tokenized::default();
    let mut index = 0;

    while index < argv.len() {
        let token = &argv[index];
        index += 1;

        if token == "--" {
            for rest in &argv[index..] {
                out.push_positional(rest);
            }
            break;
        }

        if let Some(body) = token.strip_prefix("--") {
            let (name, inline) = split_inline(body);
            match find_by_name(options, name) {
                Some(option) => consume(option, inline, argv, &mut index, &mut out)?,
                None => out.push_unknown(token),
            }
            continue;
        }

        if let Some(body) = token.strip_prefix('-').filter(|body| !body.is_empty()) {
            let (alias, inline) = split_inline(body);
            if let Some(option) = find_by_alias(options, alias) {
                consume(option, inline, argv, &mut index, &mut out)?;
            } else if is_numeric(token) {
                out.push_positional(token);
            } else if let Some(group) = inline
                .is_none()
                .then(|| expand_group(options, alias))
                .flatten()
            {
                for option in group {
                    out.record(option.name(), Value::Bool(true));
                }
            } else {
                out.push_unknown(token);
            }
            continue;
        }

        out.push_positional(token);
    }

    apply_defaults(options, &mut out)?;
    Ok(out)
}

fn consume(
    option: &CompiledOption,
    inline: Option<&str>,
    argv: &[String],
    index: &mut usize,
    out: &mut Tokenized,
) -> AppResult<()> {
    let name = option.name();
    let definition = &option.definition;

    if option.is_boolean() {
        let value = match inline {
            Some(raw) => definition.option_type.convert(name, raw)?,
            None => Value::Bool(true),
        };
        out.record(name, value);
        return Ok(());
    }

    let raw = match inline {
        Some(raw) => raw.to_string(),
        None => match argv.get(*index) {
            Some(next) if !is_flag_like(next) => {
                *index += 1;
                next.clone()
            }
            _ => return Err(AppError::invalid_value(name, "", "option requires a value")),
        },
    };
    let value = definition.option_type.convert(name, &raw)?;

    if definition.multiple {
        let mut values = vec![value];
        if inline.is_none() {
            while let Some(next) = argv.get(*index) {
                if is_flag_like(next) {
                    break;
                }
                values.push(definition.option_type.convert(name, next)?);
                *index += 1;
            }
        }
        out.append(name, values);
    } else if definition.lazy_multiple {
        out.append(name, vec![value]);
    } else {
        out.record(name, value);
    }
    Ok(())
}

/// `-abc` where every character is a one-letter alias of a boolean option
fn expand_group<'a>(options: &'a [CompiledOption], group: &str) -> Option<Vec<&'a CompiledOption>> {
    if group.chars().count() < 2 {
        return None;
    }
    group
        .chars()
        .map(|c| {
            let mut buf = [0u8; 4];
            find_by_alias(options, c.encode_utf8(&mut buf)).filter(|o| o.is_boolean())
        })
        .collect()
}

fn apply_defaults(options: &[CompiledOption], out: &mut Tokenized) -> AppResult<()> {
    for option in options {
        if out.values.contains_key(option.name()) {
            continue;
        }
        let definition = &option.definition;
        let default = match (&definition.default_value, &definition.option_type) {
            (Some(value), _) => Some(value.clone()),
            (None, super::types::OptionType::Boolean) => Some(Value::Bool(false)),
            (None, super::types::OptionType::Custom(transform)) => transform(None)?,
            (None, _) => None,
        };
        if let Some(value) = default {
            out.values.insert(option.name().to_string(), value);
        }
    }
    Ok(())
}
