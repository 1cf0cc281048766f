//! Option, positional-argument and environment-variable definitions
//!
//! Definitions are plain builders owned by the caller. The registry turns
//! them into [`CompiledOption`] values when a command is registered.

use heck::ToLowerCamelCase;
use indexmap::IndexMap;
use serde_json::{Number, Value};
use std::fmt;
use std::sync::Arc;

use crate::errors::{AppError, AppResult};

/// Transform applied to a raw token for [`OptionType::Custom`] options.
///
/// Called with `None` when the option is absent from argv.
pub type TransformFn = Arc<dyn Fn(Option<&str>) -> AppResult<Option<Value>> + Send + Sync>;

/// How raw tokens are converted into option values
#[derive(Clone)]
pub enum OptionType {
    String,
    Number,
    Boolean,
    Custom(TransformFn),
}

impl fmt::Debug for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "String"),
            Self::Number => write!(f, "Number"),
            Self::Boolean => write!(f, "Boolean"),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl OptionType {
    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean)
    }

    /// Convert one raw token into a value
    pub fn convert(&self, option: &str, raw: &str) -> AppResult<Value> {
        match self {
            Self::String => Ok(Value::String(raw.to_string())),
            Self::Number => parse_number(raw)
                .ok_or_else(|| AppError::invalid_value(option, raw, "expected a number")),
            Self::Boolean => parse_bool_literal(raw)
                .map(Value::Bool)
                .ok_or_else(|| {
                    AppError::invalid_value(option, raw, "expected true, false, 1 or 0")
                }),
            Self::Custom(transform) => Ok(transform(Some(raw))?.unwrap_or(Value::Null)),
        }
    }
}

/// Parse one of the boolean literals `true`, `false`, `1`, `0`
pub fn parse_bool_literal(raw: &str) -> Option<bool> {
    match raw {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// Declaration of a single command-line option
#[derive(Debug, Clone)]
pub struct OptionDefinition {
    pub name: String,
    pub aliases: Vec<String>,
    pub option_type: OptionType,
    pub default_value: Option<Value>,
    pub required: bool,
    pub conflicts: Vec<String>,
    pub implies: IndexMap<String, Value>,
    pub multiple: bool,
    pub lazy_multiple: bool,
    pub hidden: bool,
    pub description: Option<String>,
}

impl OptionDefinition {
    /// A string option with no alias and no default
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            option_type: OptionType::String,
            default_value: None,
            required: false,
            conflicts: Vec::new(),
            implies: IndexMap::new(),
            multiple: false,
            lazy_multiple: false,
            hidden: false,
            description: None,
        }
    }

    pub fn string(mut self) -> Self {
        self.option_type = OptionType::String;
        self
    }

    pub fn number(mut self) -> Self {
        self.option_type = OptionType::Number;
        self
    }

    pub fn boolean(mut self) -> Self {
        self.option_type = OptionType::Boolean;
        self
    }

    pub fn custom<F>(mut self, transform: F) -> Self
    where
        F: Fn(Option<&str>) -> AppResult<Option<Value>> + Send + Sync + 'static,
    {
        self.option_type = OptionType::Custom(Arc::new(transform));
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn conflicts(mut self, other: impl Into<String>) -> Self {
        self.conflicts.push(other.into());
        self
    }

    pub fn implies(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.implies.insert(key.into(), value.into());
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn lazy_multiple(mut self) -> Self {
        self.lazy_multiple = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// An option after the compile step, carrying its toolbox lookup key
#[derive(Debug, Clone)]
pub struct CompiledOption {
    pub definition: OptionDefinition,
    /// camelCase identifier used for lookups in `Toolbox::options`
    pub key: String,
    /// True for options synthesized from a `no-` counterpart
    pub synthesized: bool,
}

impl CompiledOption {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn is_boolean(&self) -> bool {
        self.definition.option_type.is_boolean()
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.definition.aliases.iter().any(|a| a == alias)
    }
}

/// The positional argument slot of a command
#[derive(Debug, Clone)]
pub struct ArgumentDefinition {
    pub name: String,
    pub description: Option<String>,
    pub multiple: bool,
}

impl ArgumentDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            multiple: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }
}

/// An environment variable read by a command
#[derive(Debug, Clone)]
pub struct EnvDefinition {
    pub name: String,
    pub option_type: OptionType,
    pub default_value: Option<Value>,
    pub description: Option<String>,
}

impl EnvDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            option_type: OptionType::String,
            default_value: None,
            description: None,
        }
    }

    pub fn option_type(mut self, option_type: OptionType) -> Self {
        self.option_type = option_type;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Key under which the resolved value appears in `Toolbox::env`
    pub fn key(&self) -> String {
        self.name.to_lowercase().to_lower_camel_case()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_conversion() {
        assert_eq!(OptionType::Number.convert("port", "8080").unwrap(), json!(8080));
        assert_eq!(OptionType::Number.convert("ratio", "0.5").unwrap(), json!(0.5));
        let err = OptionType::Number.convert("port", "eighty").unwrap_err();
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn test_boolean_literals() {
        assert_eq!(parse_bool_literal("1"), Some(true));
        assert_eq!(parse_bool_literal("false"), Some(false));
        assert_eq!(parse_bool_literal("yes"), None);
    }

    #[test]
    fn test_custom_transform() {
        let upper = OptionType::Custom(Arc::new(|raw: Option<&str>| {
            Ok(raw.map(|r| Value::String(r.to_uppercase())))
        }));
        assert_eq!(upper.convert("level", "warn").unwrap(), json!("WARN"));
    }

    #[test]
    fn test_env_key_is_camel_case() {
        assert_eq!(EnvDefinition::new("DEPLOY_TARGET").key(), "deployTarget");
        assert_eq!(EnvDefinition::new("TOKEN").key(), "token");
    }
}
