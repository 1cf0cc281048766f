//! Built-in `help` and `version` commands
//!
//! The listing is plain text; styled help output belongs to a renderer
//! layered on top of [`Cli::commands`](super::Cli::commands).

use indexmap::IndexMap;
use serde_json::{json, Value};

use super::toolbox::Toolbox;
use crate::errors::AppResult;
use crate::registry::Command;

pub const HELP_COMMAND: &str = "help";
pub const VERSION_COMMAND: &str = "version";

pub fn help_command() -> Command {
    Command::new(HELP_COMMAND)
        .description("Display the list of available commands")
        .group("General")
        .execute(|toolbox| async move { render_help(&toolbox) })
}

pub fn version_command() -> Command {
    Command::new(VERSION_COMMAND)
        .description("Display the version")
        .group("General")
        .execute(|toolbox| async move {
            let config = toolbox.runtime.cli().config();
            toolbox.logger.print(format!("{} {}", config.name, config.version));
            Ok(Value::String(config.version.clone()))
        })
}

fn render_help(toolbox: &Toolbox) -> AppResult<Value> {
    let cli = toolbox.runtime.cli();
    let logger = &toolbox.logger;
    let section = cli.command_section();

    if let Some(header) = &section.header {
        logger.print(header);
    }
    logger.print(format!("Usage: {} <command> [options]", cli.config().name));

    // alias entries point at the same command; list each command once
    let mut groups: IndexMap<String, Vec<(String, String)>> = IndexMap::new();
    for (key, command) in cli.commands() {
        if command.hidden || *key != command.key {
            continue;
        }
        let group = command.group.clone().unwrap_or_else(|| "Commands".to_string());
        let description = command.description.clone().unwrap_or_default();
        groups.entry(group).or_default().push((key.clone(), description));
    }

    let width = groups
        .values()
        .flatten()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);

    let mut listing = Vec::new();
    for (group, entries) in &groups {
        logger.print("");
        logger.print(format!("{group}:"));
        for (name, description) in entries {
            logger.print(format!("  {name:<width$}  {description}").trim_end());
            listing.push(json!({ "name": name, "description": description, "group": group }));
        }
    }

    if let Some(footer) = &section.footer {
        logger.print("");
        logger.print(footer);
    }

    Ok(Value::Array(listing))
}
