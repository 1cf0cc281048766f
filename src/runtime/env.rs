//! Environment variable resolution for commands

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;

use crate::errors::AppResult;
use crate::options::{EnvDefinition, OptionType};

/// Where declared environment variables are read from
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    #[default]
    Process,
    Fixed(HashMap<String, String>),
}

impl EnvSource {
    /// A fixed set of variables, isolated from the process environment
    pub fn fixed<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Fixed(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn get(&self, name: &str) -> Option<String> {
        match self {
            Self::Process => std::env::var(name).ok(),
            Self::Fixed(vars) => vars.get(name).cloned(),
        }
    }
}

/// Resolve a command's declared environment variables
pub fn resolve_env(
    definitions: &[EnvDefinition],
    source: &EnvSource,
) -> AppResult<IndexMap<String, Value>> {
    let mut resolved = IndexMap::new();

    for definition in definitions {
        let value = match source.get(&definition.name) {
            Some(raw) => Some(definition.option_type.convert(&definition.name, &raw)?),
            None => match (&definition.default_value, &definition.option_type) {
                (Some(default), _) => Some(default.clone()),
                (None, OptionType::Custom(transform)) => transform(None)?,
                (None, _) => None,
            },
        };
        if let Some(value) = value {
            resolved.insert(definition.key(), value);
        }
    }

    Ok(resolved)
}
