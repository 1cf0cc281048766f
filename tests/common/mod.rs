//! Common test utilities and helpers
//!
//! Binary-level tests drive the `cli-forge` executable through
//! [`TestCommand`]; library-level tests build a [`Cli`] in test mode through
//! [`test_cli`].

#![allow(dead_code)]

use assert_cmd::Command;
use cli_forge::{Cli, CliConfig, EnvSource};
use predicates::prelude::*;
use std::sync::{Arc, Mutex};

/// Test command builder for the cli-forge binary
pub struct TestCommand {
    cmd: Command,
}

impl TestCommand {
    /// Create a new test command for the cli-forge binary
    pub fn new() -> Self {
        let mut cmd = Command::cargo_bin("cli-forge").expect("Failed to find cli-forge binary");
        cmd.env_remove("CLI_FORGE_CONFIG").env_remove("RUST_LOG");
        Self { cmd }
    }

    /// Add arguments to the command
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.cmd.arg(arg.as_ref());
        }
        self
    }

    /// Set environment variable
    pub fn env<K, V>(mut self, key: K, val: V) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.cmd.env(key.as_ref(), val.as_ref());
        self
    }

    /// Execute and expect success
    pub fn expect_success(mut self) -> TestAssertion {
        let assert = self.cmd.assert().success();
        TestAssertion { assert }
    }

    /// Execute and expect the given exit code
    pub fn expect_exit_code(mut self, code: i32) -> TestAssertion {
        let assert = self.cmd.assert().code(code);
        TestAssertion { assert }
    }
}

impl Default for TestCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Test assertion wrapper with convenient methods
pub struct TestAssertion {
    assert: assert_cmd::assert::Assert,
}

impl TestAssertion {
    /// Assert stdout contains text
    pub fn stdout_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stdout(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    /// Assert stdout does not contain text
    pub fn stdout_lacks<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self
            .assert
            .stdout(predicate::str::contains(text.as_ref()).not());
        Self { assert }
    }

    /// Assert stderr contains text
    pub fn stderr_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stderr(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    /// Finish the assertion
    pub fn done(self) -> assert_cmd::assert::Assert {
        self.assert
    }
}

/// A CLI in test mode with no environment leaking in from the process
pub fn test_cli() -> Cli {
    Cli::new(CliConfig::new("testcli", "1.2.3").with_test_mode(true))
        .expect("Failed to create test CLI")
        .with_env_source(EnvSource::fixed(Vec::<(String, String)>::new()))
}

/// Shared log for recording hook and handler calls across tasks
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }
}
