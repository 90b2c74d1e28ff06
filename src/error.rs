use std::io;
use std::path::PathBuf;
use thiserror::Error;

// Import module-level errors for AppError
use crate::auth::AuthError;
use crate::config::env_file::EnvFileError;
use crate::config::first_run::SetupError;
use crate::config::settings::ConfigError;

/// Fatal errors raised while building the git layer.
///
/// Expected command failures (non-zero exit, timeout, missing binary,
/// rejected custom command) are never reported through this type; they are
/// [`ExecutionResult`](crate::git::ExecutionResult) values.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Repository path is not a directory: {0}")]
    InvalidWorkingDirectory(PathBuf),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

/// Top-level application error that wraps all module-specific errors
///
/// All module errors automatically convert to AppError via the `From` trait.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Environment file error: {0}")]
    EnvFile(#[from] EnvFileError),

    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for git layer construction
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
