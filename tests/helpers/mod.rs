#![allow(dead_code)]

use gitpanel::git::{CommandVector, ExecutionResult, ProcessRunner};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

/// Helper to create a test git repository
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().to_path_buf();

    git(&repo_path, &["init", "--initial-branch=main"]);
    git(&repo_path, &["config", "user.name", "Test User"]);
    git(&repo_path, &["config", "user.email", "test@example.com"]);
    git(&repo_path, &["config", "commit.gpgsign", "false"]);

    (temp_dir, repo_path)
}

/// Helper to create a commit
pub fn create_commit(repo_path: &Path, file: &str, content: &str, message: &str) {
    fs::write(repo_path.join(file), content).expect("Failed to write file");
    git(repo_path, &["add", file]);
    git(repo_path, &["commit", "-m", message]);
}

/// Run git directly, bypassing the crate, and return trimmed stdout
pub fn git(repo_path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .expect("Failed to run git");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// One observed invocation, program included
#[derive(Debug, Clone)]
pub struct Call {
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl Call {
    pub fn line(&self) -> String {
        self.args[1..].join(" ")
    }
}

type Script = Box<dyn Fn(&[String]) -> Option<ExecutionResult> + Send + Sync>;

/// Runner that records calls and answers from a script; calls the script
/// does not claim succeed with empty output.
pub struct FakeRunner {
    calls: Mutex<Vec<Call>>,
    script: Script,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::scripted(|_| None)
    }

    pub fn scripted<F>(script: F) -> Self
    where
        F: Fn(&[String]) -> Option<ExecutionResult> + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Box::new(script),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls().iter().map(Call::line).collect()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(
        &self,
        command: &CommandVector,
        _work_dir: &Path,
        env: &[(String, String)],
        _timeout: Duration,
    ) -> ExecutionResult {
        self.calls.lock().unwrap().push(Call {
            args: command.as_slice().to_vec(),
            env: env.to_vec(),
        });

        (self.script)(command.arguments())
            .unwrap_or_else(|| ExecutionResult::from_exit(command.to_string(), Some(0), "", ""))
    }
}

/// Successful result with the given stdout
pub fn ok(output: &str) -> Option<ExecutionResult> {
    Some(ExecutionResult::from_exit("git", Some(0), output, ""))
}

/// Failed result with the given stderr
pub fn fail(error: &str) -> Option<ExecutionResult> {
    Some(ExecutionResult::from_exit("git", Some(1), "", error))
}
