//! Scripted [`ProcessRunner`] for unit tests that must not spawn git.

use crate::git::executor::{CommandVector, ExecutionResult, ProcessRunner};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// One observed invocation
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
}

impl RecordedCall {
    /// Arguments after the program, joined by spaces
    pub fn line(&self) -> String {
        self.args[1..].join(" ")
    }
}

struct Rule {
    prefix: Vec<String>,
    exit_code: Option<i32>,
    output: String,
    error: String,
    once: bool,
}

/// Records every call and answers from a rule list matched on argument
/// prefixes (first match wins). Unmatched calls succeed with empty output.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<RecordedCall>>,
    rules: Mutex<Vec<Rule>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call whose arguments start with `prefix`
    pub fn respond(&self, prefix: &[&str], exit_code: Option<i32>, output: &str, error: &str) {
        self.push_rule(prefix, exit_code, output, error, false);
    }

    /// Answer only the next matching call
    pub fn respond_once(&self, prefix: &[&str], exit_code: Option<i32>, output: &str, error: &str) {
        self.push_rule(prefix, exit_code, output, error, true);
    }

    fn push_rule(&self, prefix: &[&str], exit_code: Option<i32>, output: &str, error: &str, once: bool) {
        self.rules.lock().unwrap().push(Rule {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            exit_code,
            output: output.to_string(),
            error: error.to_string(),
            once,
        });
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Argument lines (program omitted) of every call so far
    pub fn lines(&self) -> Vec<String> {
        self.calls().iter().map(RecordedCall::line).collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(
        &self,
        command: &CommandVector,
        _work_dir: &Path,
        env: &[(String, String)],
        timeout: Duration,
    ) -> ExecutionResult {
        self.calls.lock().unwrap().push(RecordedCall {
            args: command.as_slice().to_vec(),
            env: env.to_vec(),
            timeout,
        });

        let args = command.arguments();
        let mut rules = self.rules.lock().unwrap();
        let position = rules
            .iter()
            .position(|rule| args.len() >= rule.prefix.len() && args[..rule.prefix.len()] == rule.prefix[..]);

        let Some(position) = position else {
            return ExecutionResult::from_exit(command.to_string(), Some(0), "", "");
        };

        let rule = &rules[position];
        let result = match rule.exit_code {
            Some(_) => ExecutionResult::from_exit(
                command.to_string(),
                rule.exit_code,
                rule.output.as_str(),
                rule.error.as_str(),
            ),
            None => ExecutionResult::timed_out(command.to_string(), timeout, rule.output.as_str(), ""),
        };

        if rule.once {
            rules.remove(position);
        }
        result
    }
}
