use crate::git::binary::BinaryResolver;
use crate::git::credentials::Credentials;
use crate::git::executor::{CommandVector, ProcessRunner};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default process timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Author identity written to the repository when none is configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            name: "Git Manager".to_string(),
            email: "git@localhost".to_string(),
        }
    }
}

/// Per-request view of the repository: where it lives, which binary drives
/// it, which credentials remote operations may use, and how long a single
/// process may run. Holds no handles; dropping it needs no teardown.
#[derive(Debug, Clone)]
pub struct RepositoryContext {
    work_dir: PathBuf,
    binary: String,
    credentials: Option<Credentials>,
    timeout: Duration,
}

impl RepositoryContext {
    /// Context with an already-known binary path
    pub fn new<P: AsRef<Path>>(work_dir: P, binary: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.as_ref().to_path_buf(),
            binary: binary.into(),
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Context whose git binary is located with [`BinaryResolver::git`]
    pub fn resolve<P: AsRef<Path>, R: ProcessRunner + ?Sized>(work_dir: P, runner: &R) -> Self {
        let binary = BinaryResolver::git().resolve(runner);
        Self::new(work_dir, binary)
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the credential pair as a whole
    pub fn set_credentials(&mut self, credentials: Option<Credentials>) {
        self.credentials = credentials;
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fresh vector starting with the resolved binary
    pub fn command(&self) -> CommandVector {
        CommandVector::new(self.binary.as_str())
    }
}
