use crate::git::{CommandVector, DEFAULT_TIMEOUT, ExecutionResult, ProcessRunner};
use crate::security::tokenize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Pass-through to the hosting application's own CLI (for example
/// `php artisan`), run in the repository directory.
#[derive(Debug, Clone)]
pub struct AppConsole {
    prefix: Vec<String>,
    work_dir: PathBuf,
    timeout: Duration,
}

impl AppConsole {
    /// `app_command` is tokenized once; an empty one disables the console
    pub fn new<P: AsRef<Path>>(app_command: &str, work_dir: P) -> Self {
        Self {
            prefix: tokenize(app_command),
            work_dir: work_dir.as_ref().to_path_buf(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_enabled(&self) -> bool {
        !self.prefix.is_empty()
    }

    /// Run `command` after the configured prefix
    pub fn run<R: ProcessRunner + ?Sized>(&self, runner: &R, command: &str) -> ExecutionResult {
        let Some((program, prefix_args)) = self.prefix.split_first() else {
            return ExecutionResult::rejected(command.trim(), "No application command is configured");
        };

        let args = tokenize(command);
        if args.is_empty() {
            return ExecutionResult::rejected(self.prefix.join(" "), "No command given");
        }

        let vector = CommandVector::new(program.as_str())
            .args(prefix_args.iter().cloned())
            .args(args);

        info!(command = %vector, "running application command");
        runner.run(&vector, &self.work_dir, &[], self.timeout)
    }
}
