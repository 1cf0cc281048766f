//! Plugin lifecycle management
//!
//! Plugins hook into every command invocation. The manager runs their
//! hooks sequentially in an order that respects declared dependencies.

pub mod manager;
pub mod types;

pub use manager::PluginManager;
pub use types::{HookKind, Plugin, PluginContext};
