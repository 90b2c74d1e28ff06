use crate::audit::AuditLogger;
use crate::error::{GitError, GitResult};
use crate::git::context::{Identity, RepositoryContext};
use crate::git::credentials::{CredentialInjector, Credentials, redact_url};
use crate::git::executor::{CommandVector, ExecutionResult, ProcessRunner, SystemRunner};
use crate::git::parser::LOG_FORMAT;
use crate::git::remote::RemoteAuthGuard;
use crate::security::{BLOCKED_COMMAND_MESSAGE, CommandFilter, tokenize};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// How far `git reset` rewinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetMode {
    Soft,
    Mixed,
    #[default]
    Hard,
}

impl ResetMode {
    pub fn flag(&self) -> &'static str {
        match self {
            ResetMode::Soft => "--soft",
            ResetMode::Mixed => "--mixed",
            ResetMode::Hard => "--hard",
        }
    }
}

impl FromStr for ResetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "soft" => Ok(ResetMode::Soft),
            "mixed" => Ok(ResetMode::Mixed),
            "hard" => Ok(ResetMode::Hard),
            other => Err(format!("Invalid reset mode: {}", other)),
        }
    }
}

impl fmt::Display for ResetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResetMode::Soft => "soft",
            ResetMode::Mixed => "mixed",
            ResetMode::Hard => "hard",
        };
        write!(f, "{}", name)
    }
}

/// Snapshot for the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryInfo {
    pub status: ExecutionResult,
    pub current_branch: ExecutionResult,
    pub remotes: ExecutionResult,
}

/// Effective author identity (empty when unset)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitUser {
    pub name: String,
    pub email: String,
}

/// Outcome of writing both halves of the author identity
#[derive(Debug, Clone, Serialize)]
pub struct UserConfigResult {
    pub success: bool,
    pub name_result: ExecutionResult,
    pub email_result: ExecutionResult,
}

/// One git operation per method, each building its argument vector
/// directly and returning the uniform [`ExecutionResult`].
///
/// Remote operations (push, pull, fetch, tag push) run inside a
/// [`RemoteAuthGuard`] so the remote URL carries credentials only for the
/// duration of the call.
pub struct GitManager<R: ProcessRunner = SystemRunner> {
    ctx: RepositoryContext,
    runner: R,
    filter: CommandFilter,
    audit: Option<Arc<AuditLogger>>,
}

impl<R: ProcessRunner> GitManager<R> {
    /// Open the repository at the context's working directory.
    ///
    /// Writes `fallback` as the repository-local author identity when git
    /// reports none; an existing identity is never overwritten.
    pub fn new(ctx: RepositoryContext, runner: R, fallback: &Identity) -> GitResult<Self> {
        if !ctx.work_dir().is_dir() {
            return Err(GitError::InvalidWorkingDirectory(ctx.work_dir().to_path_buf()));
        }

        let manager = Self {
            ctx,
            runner,
            filter: CommandFilter::default(),
            audit: None,
        };
        manager.ensure_identity(fallback);

        Ok(manager)
    }

    pub fn with_audit(mut self, audit: Option<Arc<AuditLogger>>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_filter(mut self, filter: CommandFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn context(&self) -> &RepositoryContext {
        &self.ctx
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn set_credentials(&mut self, credentials: Option<Credentials>) {
        self.ctx.set_credentials(credentials);
    }

    pub(crate) fn injector(&self) -> CredentialInjector<'_> {
        CredentialInjector::new(self.ctx.credentials())
    }

    /// Fresh vector starting with the git binary
    pub(crate) fn git(&self) -> CommandVector {
        self.ctx.command()
    }

    pub(crate) fn run(&self, command: CommandVector) -> ExecutionResult {
        self.run_with_env(command, &[])
    }

    fn run_with_env(&self, command: CommandVector, env: &[(String, String)]) -> ExecutionResult {
        let result = self
            .runner
            .run(&command, self.ctx.work_dir(), env, self.ctx.timeout());

        if let Some(audit) = &self.audit {
            if let Err(e) = audit.log_command(&result.command, self.ctx.work_dir(), result.exit_code) {
                warn!(error = %e, "failed to write audit log");
            }
        }

        result
    }

    /// Environment for operations that may talk to a remote
    fn auth_env(&self) -> Vec<(String, String)> {
        if self.ctx.credentials().is_some() {
            vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())]
        } else {
            Vec::new()
        }
    }

    /// Run a remote operation with the remote temporarily credentialed
    fn run_remote(&self, remote: &str, command: CommandVector) -> ExecutionResult {
        let env = self.auth_env();
        let _guard = RemoteAuthGuard::acquire(self, remote);
        info!(remote, command = %command, "running remote operation");
        self.run_with_env(command, &env)
    }

    fn ensure_identity(&self, fallback: &Identity) {
        for (key, value) in [("user.email", &fallback.email), ("user.name", &fallback.name)] {
            let current = self.run(self.git().args(["config", key]));
            if current.success && !current.trimmed_output().is_empty() {
                continue;
            }

            info!(key, value = %value, "configuring fallback identity");
            let set = self.run(self.git().args(["config", "--local", key, value.as_str()]));
            if !set.success {
                warn!(key, error = %set.error.trim(), "failed to configure fallback identity");
            }
        }
    }

    /// Branch to push or pull when the caller named none
    fn resolve_branch(&self, branch: Option<&str>, action: &str, remote: &str) -> Result<String, ExecutionResult> {
        if let Some(branch) = branch.filter(|b| !b.is_empty()) {
            return Ok(branch.to_string());
        }

        let current = self.current_branch();
        if !current.success {
            return Err(current);
        }

        let name = current.trimmed_output();
        if name.is_empty() {
            return Err(ExecutionResult::rejected(
                self.git().args([action, remote]).to_string(),
                "Could not determine the current branch (detached HEAD?). Specify a branch explicitly.",
            ));
        }

        Ok(name.to_string())
    }

    pub fn status(&self) -> ExecutionResult {
        self.run(self.git().arg("status"))
    }

    pub fn current_branch(&self) -> ExecutionResult {
        self.run(self.git().args(["branch", "--show-current"]))
    }

    /// Local and remote-tracking branches
    pub fn branches(&self) -> ExecutionResult {
        self.run(self.git().args(["branch", "-a"]))
    }

    /// Stage paths; an empty list stages everything
    pub fn add<S: AsRef<str>>(&self, files: &[S]) -> ExecutionResult {
        let mut command = self.git().args(["add", "--"]);
        if files.is_empty() {
            command = command.arg(".");
        } else {
            command = command.args(files.iter().map(|f| f.as_ref().to_string()));
        }
        self.run(command)
    }

    pub fn commit(&self, message: &str) -> ExecutionResult {
        self.run(self.git().args(["commit", "-m", message]))
    }

    /// Push a branch, defaulting to the current one
    pub fn push(&self, remote: &str, branch: Option<&str>, force: bool) -> ExecutionResult {
        let branch = match self.resolve_branch(branch, "push", remote) {
            Ok(branch) => branch,
            Err(failure) => return failure,
        };

        let mut command = self.git().args(["push", remote]);
        if force {
            command = command.arg("--force");
        }
        self.run_remote(remote, command.arg(branch))
    }

    /// Pull a branch, defaulting to the current one
    pub fn pull(&self, remote: &str, branch: Option<&str>) -> ExecutionResult {
        let branch = match self.resolve_branch(branch, "pull", remote) {
            Ok(branch) => branch,
            Err(failure) => return failure,
        };

        self.run_remote(remote, self.git().args(["pull", remote, branch.as_str()]))
    }

    pub fn fetch(&self, remote: &str) -> ExecutionResult {
        self.run_remote(remote, self.git().args(["fetch", remote]))
    }

    pub fn checkout(&self, branch: &str, create: bool) -> ExecutionResult {
        let mut command = self.git().arg("checkout");
        if create {
            command = command.arg("-b");
        }
        self.run(command.arg(branch))
    }

    pub fn merge(&self, branch: &str, message: Option<&str>) -> ExecutionResult {
        let mut command = self.git().args(["merge", branch]);
        if let Some(message) = message.filter(|m| !m.is_empty()) {
            command = command.args(["-m", message]);
        }
        self.run(command)
    }

    /// Create a branch, switching to it when `checkout` is set
    pub fn create_branch(&self, name: &str, checkout: bool) -> ExecutionResult {
        if checkout {
            return self.checkout(name, true);
        }
        self.run(self.git().args(["branch", name]))
    }

    pub fn delete_branch(&self, name: &str, force: bool) -> ExecutionResult {
        let flag = if force { "-D" } else { "-d" };
        self.run(self.git().args(["branch", flag, name]))
    }

    /// Most recent `limit` commits in `hash|author|email|date|subject` form
    pub fn log(&self, limit: u32) -> ExecutionResult {
        self.run(
            self.git()
                .args(["log", LOG_FORMAT, "-n"])
                .arg(limit.to_string()),
        )
    }

    /// Unstaged diff, optionally restricted to one path
    pub fn diff(&self, file: Option<&str>) -> ExecutionResult {
        let mut command = self.git().arg("diff");
        if let Some(file) = file.filter(|f| !f.is_empty()) {
            command = command.args(["--", file]);
        }
        self.run(command)
    }

    pub fn stash(&self, message: Option<&str>) -> ExecutionResult {
        match message.filter(|m| !m.is_empty()) {
            Some(message) => self.run(self.git().args(["stash", "push", "-m", message])),
            None => self.run(self.git().arg("stash")),
        }
    }

    pub fn stash_pop(&self) -> ExecutionResult {
        self.run(self.git().args(["stash", "pop"]))
    }

    pub fn stash_list(&self) -> ExecutionResult {
        self.run(self.git().args(["stash", "list"]))
    }

    pub fn reset(&self, mode: ResetMode, commit: &str) -> ExecutionResult {
        self.run(self.git().args(["reset", mode.flag(), commit]))
    }

    pub fn tags(&self) -> ExecutionResult {
        self.run(self.git().args(["tag", "-l"]))
    }

    /// Lightweight tag, or annotated when a message is given
    pub fn create_tag(&self, name: &str, message: Option<&str>) -> ExecutionResult {
        match message.filter(|m| !m.is_empty()) {
            Some(message) => self.run(self.git().args(["tag", "-a", name, "-m", message])),
            None => self.run(self.git().args(["tag", name])),
        }
    }

    pub fn delete_tag(&self, name: &str) -> ExecutionResult {
        self.run(self.git().args(["tag", "-d", name]))
    }

    pub fn push_tags(&self, remote: &str) -> ExecutionResult {
        self.run_remote(remote, self.git().args(["push", remote, "--tags"]))
    }

    /// Run an operator-typed command after the denylist check.
    ///
    /// The raw string is checked before it is tokenized; a leading `git` is
    /// dropped. Runs with the credential environment but without rewriting
    /// any remote URL.
    pub fn execute_custom(&self, command: &str) -> ExecutionResult {
        let trimmed = command.trim();
        let shown = trimmed
            .split_whitespace()
            .map(redact_url)
            .collect::<Vec<_>>()
            .join(" ");

        if let Some(fragment) = self.filter.violation(trimmed) {
            warn!(command = %shown, fragment, "blocked custom command");
            if let Some(audit) = &self.audit {
                let reason = format!("matched denied fragment '{}'", fragment);
                if let Err(e) = audit.log_rejection(&shown, &reason, self.ctx.work_dir()) {
                    warn!(error = %e, "failed to write audit log");
                }
            }
            return ExecutionResult::rejected(shown, BLOCKED_COMMAND_MESSAGE);
        }

        let tokens = tokenize(strip_git_prefix(trimmed));
        if tokens.is_empty() {
            return ExecutionResult::rejected(shown, "No command given");
        }

        let env = self.auth_env();
        self.run_with_env(self.git().args(tokens), &env)
    }

    /// Set the author identity, globally or for this repository only
    pub fn config_user(&self, name: &str, email: &str, global: bool) -> UserConfigResult {
        let scope = if global { "--global" } else { "--local" };
        let name_result = self.run(self.git().args(["config", scope, "user.name", name]));
        let email_result = self.run(self.git().args(["config", scope, "user.email", email]));

        UserConfigResult {
            success: name_result.success && email_result.success,
            name_result,
            email_result,
        }
    }

    pub fn git_user(&self) -> GitUser {
        let read = |key: &str| {
            let result = self.run(self.git().args(["config", key]));
            if result.success {
                result.trimmed_output().to_string()
            } else {
                String::new()
            }
        };

        GitUser {
            name: read("user.name"),
            email: read("user.email"),
        }
    }

    pub fn info(&self) -> RepositoryInfo {
        RepositoryInfo {
            status: self.status(),
            current_branch: self.current_branch(),
            remotes: self.run(self.git().args(["remote", "-v"])),
        }
    }

    /// Machine-readable status
    pub fn changed_files(&self) -> ExecutionResult {
        self.run(self.git().args(["status", "--porcelain"]))
    }

    /// True when the working tree or index differs from HEAD
    pub fn has_changes(&self) -> bool {
        let status = self.changed_files();
        status.success && !status.trimmed_output().is_empty()
    }
}

fn strip_git_prefix(command: &str) -> &str {
    match command.strip_prefix("git") {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => command,
    }
}
