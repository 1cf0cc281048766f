//! Demo commands

use cli_forge::{
    AppError, ArgumentDefinition, Cli, CliConfig, Command, CommandSection, EnvDefinition,
    OptionDefinition, RunCommandOptions,
};
use serde_json::{json, Value};

use super::plugins::AuditPlugin;

/// Assemble the demo CLI
pub fn build_cli(config: CliConfig) -> cli_forge::AppResult<Cli> {
    let mut cli = Cli::new(config)?;

    cli.set_command_section(CommandSection {
        header: Some("cli-forge: a demo of nested commands, options and plugins".to_string()),
        footer: Some("Run `cli-forge <command> --help` for command help.".to_string()),
    });

    cli.add_command(build_command())?;
    cli.add_command(deploy_command())?;
    cli.add_command(deploy_staging_command())?;
    cli.add_command(greet_command())?;
    cli.add_plugin(AuditPlugin::default())?;

    Ok(cli)
}

fn build_command() -> Command {
    Command::new("build")
        .alias("b")
        .description("Build the project")
        .group("Project")
        .option(
            OptionDefinition::new("production")
                .boolean()
                .alias("p")
                .implies("minify", true)
                .description("Build for production"),
        )
        .option(OptionDefinition::new("minify").boolean().description("Minify output"))
        .option(
            OptionDefinition::new("target")
                .string()
                .alias("t")
                .default_value("release")
                .description("Build target"),
        )
        .execute(|toolbox| async move {
            let production = toolbox.flag("production");
            let minify = toolbox.flag("minify");
            let target = toolbox.option_str("target").unwrap_or("release").to_string();

            toolbox.logger.print(format!(
                "Building {target} (production: {production}, minify: {minify})"
            ));
            Ok(json!({ "target": target, "production": production, "minify": minify }))
        })
}

fn deploy_command() -> Command {
    Command::new("deploy")
        .description("Build for production and deploy")
        .group("Project")
        .option(
            OptionDefinition::new("no-build")
                .boolean()
                .description("Skip the production build"),
        )
        .execute(|toolbox| async move {
            let build = if toolbox.flag("build") {
                toolbox
                    .runtime
                    .run_command("build", RunCommandOptions::new().argv(["--production"]))
                    .await?
            } else {
                Value::Null
            };

            toolbox.logger.print("Deployed");
            Ok(json!({ "deployed": true, "build": build }))
        })
}

fn deploy_staging_command() -> Command {
    Command::new("staging")
        .path(["deploy"])
        .description("Deploy to the staging environment")
        .group("Project")
        .option(OptionDefinition::new("dry-run").boolean().description("Only print the plan"))
        .env(EnvDefinition::new("STAGING_URL").default_value("https://staging.invalid"))
        .execute(|toolbox| async move {
            let url = toolbox
                .env_var("STAGING_URL")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            if toolbox.flag("dry-run") {
                toolbox.logger.print(format!("Would deploy to {url}"));
            } else {
                toolbox.logger.print(format!("Deploying to {url}"));
            }
            Ok(json!({ "url": url, "dryRun": toolbox.flag("dry-run") }))
        })
}

fn greet_command() -> Command {
    Command::new("greet")
        .description("Greet people by name")
        .argument(ArgumentDefinition::new("names").multiple())
        .option(OptionDefinition::new("shout").boolean().alias("s"))
        .execute(|toolbox| async move {
            if toolbox.argument.is_empty() {
                return Err(AppError::command_failed("greet", "at least one name is required"));
            }

            let mut greeting = format!("Hello, {}!", toolbox.argument.join(", "));
            if toolbox.flag("shout") {
                greeting = greeting.to_uppercase();
            }
            toolbox.logger.print(&greeting);
            Ok(Value::String(greeting))
        })
}
