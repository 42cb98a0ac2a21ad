//! Test utilities and mocks for harbour-meson unit tests.
//!
//! [`MockRunner`] stands in for process execution so lifecycle tests can
//! assert on the exact commands and environments the adapter produced
//! without Meson or Ninja installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use harbour_meson::test_support::{MockRunner, linux_package, test_config};
//!
//! #[test]
//! fn test_example() {
//!     let runner = MockRunner::new();
//!     runner.expect(CommandPattern::StartsWith("meson".into()), ProcessOutput::success(""));
//!
//!     let mut meson = Meson::new(linux_package(tmp.path()), test_config(), runner.clone());
//!     meson.configure(&ConfigureArgs::new())?;
//!     assert_eq!(runner.calls().len(), 1);
//! }
//! ```

pub mod fixtures;

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};

use crate::builder::activation::ToolchainActivation;
use crate::builder::env::EnvironmentOverlay;
use crate::core::settings::SettingsView;
use crate::util::process::{CommandLine, ProcessOutput, ProcessRunner};

// Re-export fixtures for convenience
pub use fixtures::*;

/// Pattern for matching commands in [`MockRunner`].
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on the full command string.
    Exact(String),
    /// Match if the command starts with the prefix.
    StartsWith(String),
    /// Match if the command contains the substring.
    Contains(String),
    /// Match any command.
    Any,
}

impl CommandPattern {
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s.as_str()),
            CommandPattern::Contains(s) => cmd.contains(s.as_str()),
            CommandPattern::Any => true,
        }
    }
}

/// Scripted result of one run.
#[derive(Debug, Clone)]
enum Scripted {
    Output(ProcessOutput),
    LaunchError(String),
}

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: CommandLine,
    /// Overlay handed to the runner
    pub env: EnvironmentOverlay,
    /// Process-environment values of watched variables at run time
    pub watched: Vec<(String, Option<String>)>,
}

#[derive(Debug, Default)]
struct MockState {
    expectations: Vec<(CommandPattern, Scripted)>,
    queue: VecDeque<Scripted>,
    calls: Vec<Invocation>,
    watched: Vec<String>,
}

/// Mock process runner.
///
/// Results come from the first matching expectation, then from the queue
/// of pushed results, then default to a successful run with empty output.
/// Clones share state, so a test can hand one clone to the adapter and
/// inspect the calls through another.
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    state: Arc<Mutex<MockState>>,
}

impl MockRunner {
    pub fn new() -> Self {
        MockRunner::default()
    }

    /// Snapshot `key` from the process environment on every run.
    pub fn watch_env(self, key: impl Into<String>) -> Self {
        self.lock().watched.push(key.into());
        self
    }

    /// Answer every command matching `pattern` with `output`.
    pub fn expect(&self, pattern: CommandPattern, output: ProcessOutput) {
        self.lock()
            .expectations
            .push((pattern, Scripted::Output(output)));
    }

    /// Queue the output of the next unmatched run.
    pub fn push_output(&self, output: ProcessOutput) {
        self.lock().queue.push_back(Scripted::Output(output));
    }

    /// Make the next unmatched run fail to launch.
    pub fn push_error(&self, message: &str) {
        self.lock()
            .queue
            .push_back(Scripted::LaunchError(message.to_string()));
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.lock().calls.clone()
    }

    /// Recorded commands rendered as strings.
    pub fn command_lines(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .map(|c| c.command.to_string())
            .collect()
    }

    pub fn was_called(&self, pattern: &CommandPattern) -> bool {
        self.command_lines().iter().any(|c| pattern.matches(c))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ProcessRunner for MockRunner {
    fn run(&self, command: &CommandLine, env: &EnvironmentOverlay) -> Result<ProcessOutput> {
        let mut state = self.lock();
        let rendered = command.to_string();

        let watched = state
            .watched
            .iter()
            .map(|key| (key.clone(), std::env::var(key).ok()))
            .collect();
        state.calls.push(Invocation {
            command: command.clone(),
            env: env.clone(),
            watched,
        });

        let expected = state
            .expectations
            .iter()
            .find(|(pattern, _)| pattern.matches(&rendered))
            .map(|(_, scripted)| scripted.clone());
        let scripted = match expected {
            Some(scripted) => Some(scripted),
            None => state.queue.pop_front(),
        };

        match scripted {
            Some(Scripted::Output(output)) => Ok(output),
            Some(Scripted::LaunchError(message)) => Err(anyhow!(message)),
            None => Ok(ProcessOutput::success("")),
        }
    }
}

/// Toolchain activation returning fixed variables.
#[derive(Debug, Clone, Default)]
pub struct FakeActivation {
    vars: BTreeMap<String, String>,
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl FakeActivation {
    pub fn new<'a>(vars: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        FakeActivation {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    /// An activation that always fails with `message`.
    pub fn failing(message: &str) -> Self {
        FakeActivation {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Number of times the variables were requested.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ToolchainActivation for FakeActivation {
    fn activation_vars(&self, _settings: &dyn SettingsView) -> Result<BTreeMap<String, String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref message) = self.failure {
            bail!("{}", message);
        }
        Ok(self.vars.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_runner_records_calls() {
        let runner = MockRunner::new();
        let command = CommandLine::new("ninja").arg("-C").arg("build");
        let mut env = EnvironmentOverlay::new();
        env.set("A", "1");

        let output = runner.run(&command, &env).unwrap();
        assert!(output.is_success());

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].env.get("A"), Some(Some("1")));
        assert!(runner.was_called(&CommandPattern::Exact("ninja -C build".into())));
    }

    #[test]
    fn test_mock_runner_expectations_before_queue() {
        let runner = MockRunner::new();
        runner.expect(
            CommandPattern::StartsWith("meson --version".into()),
            ProcessOutput::success("1.4.0"),
        );
        runner.push_output(ProcessOutput::failure(2, "queued"));

        let env = EnvironmentOverlay::new();
        let version = runner
            .run(&CommandLine::new("meson").arg("--version"), &env)
            .unwrap();
        assert_eq!(version.stdout, "1.4.0");

        let queued = runner.run(&CommandLine::new("ninja"), &env).unwrap();
        assert_eq!(queued.code, Some(2));

        let default = runner.run(&CommandLine::new("ninja"), &env).unwrap();
        assert!(default.is_success());
    }

    #[test]
    fn test_mock_runner_clones_share_state() {
        let runner = MockRunner::new();
        let other = runner.clone();
        other.push_error("spawn failed");

        let err = runner
            .run(&CommandLine::new("meson"), &EnvironmentOverlay::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "spawn failed");
        assert_eq!(other.calls().len(), 1);
    }

    #[test]
    fn test_fake_activation_counts_calls() {
        let activation = FakeActivation::new([("PATH", "C:\\VC")]);
        let settings = crate::core::settings::Settings::new();

        assert_eq!(activation.activation_vars(&settings).unwrap()["PATH"], "C:\\VC");
        assert_eq!(activation.clone().calls(), 1);
        assert!(FakeActivation::failing("no vs")
            .activation_vars(&settings)
            .is_err());
    }
}
