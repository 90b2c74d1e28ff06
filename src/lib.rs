pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod console;
pub mod error;
pub mod git;
pub mod security;
pub mod server;

// Re-export commonly used types for convenience
pub use error::{AppError, AppResult, GitError, GitResult};
pub use git::{CommandVector, ExecutionResult, GitManager, ProcessRunner, SystemRunner};
