use crate::git::executor::{CommandVector, ProcessRunner};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Conventional install locations searched on Windows
const WINDOWS_CANDIDATES: &[&str] = &[
    r"C:\Program Files\Git\bin\git.exe",
    r"C:\Program Files (x86)\Git\bin\git.exe",
    r"C:\laragon\bin\git\bin\git.exe",
];

/// Conventional install locations searched on POSIX systems
const POSIX_CANDIDATES: &[&str] = &["/usr/bin/git", "/usr/local/bin/git"];

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Posix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }
}

/// Locates the executable to invoke for a program name.
///
/// Resolution order: a no-op `--version` run of the bare name, then on
/// Windows `where` and the conventional install paths, on POSIX `which` and
/// the conventional install paths. When everything fails the bare name is
/// returned so the failure surfaces on first real use.
#[derive(Debug, Clone)]
pub struct BinaryResolver {
    program: String,
    platform: Platform,
    candidates: Vec<PathBuf>,
}

impl BinaryResolver {
    /// Resolver for an arbitrary program with no fallback paths
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            platform: Platform::current(),
            candidates: Vec::new(),
        }
    }

    /// Resolver for git with the platform's conventional install paths
    pub fn git() -> Self {
        let platform = Platform::current();
        let candidates = match platform {
            Platform::Windows => WINDOWS_CANDIDATES,
            Platform::Posix => POSIX_CANDIDATES,
        };

        Self {
            program: "git".to_string(),
            platform,
            candidates: candidates.iter().map(PathBuf::from).collect(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Replace the fallback install paths
    pub fn with_candidates<I, P>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Resolve the executable path, consulting `runner` for each lookup
    pub fn resolve<R: ProcessRunner + ?Sized>(&self, runner: &R) -> String {
        if self.can_run(runner) {
            debug!(program = %self.program, "resolved from PATH");
            return self.program.clone();
        }

        let locator = match self.platform {
            Platform::Windows => "where",
            Platform::Posix => "which",
        };

        if let Some(path) = self.locate_with(runner, locator) {
            debug!(program = %self.program, %path, locator, "resolved via locator");
            return path;
        }

        if let Some(path) = self.candidates.iter().find(|p| p.exists()) {
            debug!(program = %self.program, path = %path.display(), "resolved from install path");
            return path.display().to_string();
        }

        warn!(
            program = %self.program,
            "could not resolve binary path, using bare program name"
        );
        self.program.clone()
    }

    fn can_run<R: ProcessRunner + ?Sized>(&self, runner: &R) -> bool {
        let check = CommandVector::new(self.program.as_str()).arg("--version");
        runner.run(&check, lookup_dir(), &[], LOOKUP_TIMEOUT).success
    }

    fn locate_with<R: ProcessRunner + ?Sized>(&self, runner: &R, locator: &str) -> Option<String> {
        let query = CommandVector::new(locator).arg(self.program.as_str());
        let result = runner.run(&query, lookup_dir(), &[], LOOKUP_TIMEOUT);
        if !result.success {
            return None;
        }

        result
            .output
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
    }
}

fn lookup_dir() -> &'static Path {
    Path::new(".")
}
