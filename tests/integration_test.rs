mod common;

use common::TestCommand;

#[test]
fn test_cli_help_is_default() {
    TestCommand::new()
        .expect_success()
        .stdout_contains("Usage: cli-forge <command> [options]")
        .stdout_contains("Project:")
        .stdout_contains("deploy staging")
        .stdout_contains("General:")
        .done();
}

#[test]
fn test_cli_help_lists_each_command_once() {
    // `b` is an alias of `build`
    let output = TestCommand::new().args(["help"]).expect_success().done();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();

    assert!(stdout.contains("  build"));
    assert!(!stdout.lines().any(|line| line.trim_start().starts_with("b ")));
}

#[test]
fn test_cli_version() {
    TestCommand::new()
        .args(["--version"])
        .expect_success()
        .stdout_contains(format!("cli-forge {}", env!("CARGO_PKG_VERSION")))
        .done();
}

#[test]
fn test_version_flag_on_any_command() {
    TestCommand::new()
        .args(["build", "-V"])
        .expect_success()
        .stdout_contains("cli-forge")
        .stdout_lacks("Building")
        .done();
}

#[test]
fn test_build_command() {
    TestCommand::new()
        .args(["build", "--production", "--target", "web"])
        .expect_success()
        .stdout_contains("Building web (production: true, minify: true)")
        .done();
}

#[test]
fn test_build_boolean_literal() {
    TestCommand::new()
        .args(["build", "--production", "false"])
        .expect_success()
        .stdout_contains("Building release (production: false, minify: false)")
        .done();
}

#[test]
fn test_deploy_runs_nested_build() {
    TestCommand::new()
        .args(["deploy"])
        .expect_success()
        .stdout_contains("Building release (production: true, minify: true)")
        .stdout_contains("Deployed")
        .done();
}

#[test]
fn test_nested_command_with_env() {
    TestCommand::new()
        .args(["deploy", "staging", "--dry-run"])
        .env("STAGING_URL", "https://staging.example.com")
        .expect_success()
        .stdout_contains("Would deploy to https://staging.example.com")
        .done();
}

#[test]
fn test_quiet_suppresses_output() {
    TestCommand::new()
        .args(["greet", "Ada", "-q"])
        .expect_success()
        .stdout_lacks("Hello")
        .done();
}

#[test]
fn test_unknown_command_suggests() {
    TestCommand::new()
        .args(["buld"])
        .expect_exit_code(1)
        .stderr_contains("Command \"buld\" not found. Did you mean: build?")
        .done();
}

#[test]
fn test_unknown_option_suggests() {
    TestCommand::new()
        .args(["build", "--prod"])
        .expect_exit_code(1)
        .stderr_contains("--prod (did you mean --production?)")
        .done();
}

#[test]
fn test_conflicting_global_options() {
    TestCommand::new()
        .args(["build", "--quiet", "--verbose"])
        .expect_exit_code(1)
        .stderr_contains("cannot be used together")
        .done();
}

#[test]
fn test_handler_failure_exits_nonzero() {
    TestCommand::new()
        .args(["greet"])
        .expect_exit_code(1)
        .stderr_contains("at least one name is required")
        .done();
}
