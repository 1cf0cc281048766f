//! Option resolution pipeline
//!
//! Definitions are compiled once when a command is registered; each
//! invocation then resolves raw argv tokens into typed values and
//! validates them.

pub mod compile;
pub mod pipeline;
pub mod tokenizer;
pub mod types;
pub mod validator;

use indexmap::IndexMap;
use serde_json::Value;

pub use compile::{compile_options, merge_options, option_key, synthesize_negations};
pub use pipeline::{extract_boolean_literals, resolve_options, ResolvedOptions};
pub use types::{
    ArgumentDefinition, CompiledOption, EnvDefinition, OptionDefinition, OptionType, TransformFn,
};
pub use validator::{validate, ValidationRules};

/// Options injected programmatically, keyed by option name or camelCase key
pub type ExtraOptions = IndexMap<String, Value>;
