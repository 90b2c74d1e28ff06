pub mod binary;
pub mod context;
pub mod credentials;
pub mod executor;
pub mod manager;
pub mod parser;
pub mod remote;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use binary::{BinaryResolver, Platform};
pub use context::{DEFAULT_TIMEOUT, Identity, RepositoryContext};
pub use credentials::{CredentialInjector, Credentials, redact_url, strip_auth};
pub use executor::{CommandVector, ExecutionResult, ProcessRunner, SystemRunner};
pub use manager::{GitManager, GitUser, RepositoryInfo, ResetMode, UserConfigResult};
pub use parser::{
    BranchEntry, CommitEntry, FileStatus, StashEntry, StatusEntry, parse_branch_list, parse_log,
    parse_stash_list, parse_status_porcelain, parse_tag_list,
};
pub use remote::RemoteAuthGuard;
pub use workflow::{StepResult, WorkflowReport};
