pub mod filter;
pub mod tokenizer;

pub use filter::CommandFilter;
pub use tokenizer::tokenize;

/// Fragments that block a free-form command outright.
///
/// Matched case-insensitively as substrings of the raw command string, before
/// it is tokenized. This is a best-effort denylist for an operator-facing
/// escape hatch, not a sandbox: anything not listed here reaches git.
pub const DENIED_COMMAND_FRAGMENTS: &[&str] = &[
    // Removing tracked files
    "rm ",
    // Wiping untracked files and directories
    "clean -fd",
    // Throwing away commits
    "reset --hard HEAD~",
];

/// Error text returned for a blocked custom command
pub const BLOCKED_COMMAND_MESSAGE: &str =
    "Dangerous command blocked for safety. Use specific methods instead.";
