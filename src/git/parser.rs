//! Structured views over the plain-text output of read-only git commands.
//!
//! Parsing never fails: lines that don't fit the expected shape are skipped,
//! and the raw output stays available on the [`ExecutionResult`](super::ExecutionResult).

use serde::Serialize;

/// `git log` format the facade requests; fields are split on `|`
pub const LOG_FORMAT: &str = "--pretty=format:%H|%an|%ae|%ad|%s";

/// Parse `git status --porcelain` (v1) output
pub fn parse_status_porcelain(output: &str) -> Vec<StatusEntry> {
    let mut entries = Vec::new();

    for line in output.lines() {
        // Format: XY <path>  or  XY <orig> -> <path>
        if line.len() < 4 || !line.is_char_boundary(2) || !line.is_char_boundary(3) {
            continue;
        }

        let mut codes = line[..2].chars();
        let (Some(x), Some(y)) = (codes.next(), codes.next()) else {
            continue;
        };
        let raw_path = &line[3..];

        let (original_path, path) = match raw_path.split_once(" -> ") {
            Some((from, to)) => (Some(unquote(from)), unquote(to)),
            None => (None, unquote(raw_path)),
        };

        let status = FileStatus::from_codes(x, y);
        let untracked = status == FileStatus::Untracked || status == FileStatus::Ignored;

        entries.push(StatusEntry {
            status,
            path,
            original_path,
            staged: !untracked && x != ' ',
            unstaged: !untracked && y != ' ',
        });
    }

    entries
}

/// Parse `git log` output produced with [`LOG_FORMAT`]
pub fn parse_log(output: &str) -> Vec<CommitEntry> {
    let mut commits = Vec::new();

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }

        // The subject is last so it may itself contain '|'
        let mut parts = line.splitn(5, '|');
        let mut next = || parts.next().unwrap_or_default().to_string();

        commits.push(CommitEntry {
            hash: next(),
            author: next(),
            email: next(),
            date: next(),
            message: next(),
        });
    }

    commits
}

/// Parse `git branch -a` output
pub fn parse_branch_list(output: &str) -> Vec<BranchEntry> {
    let mut branches = Vec::new();

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }

        // Format: * main
        //           remotes/origin/HEAD -> origin/main
        //           remotes/origin/main
        let is_current = line.starts_with('*');
        let name = line.trim_start_matches('*').trim();

        // Symbolic refs only point at another listed branch
        if name.contains(" -> ") {
            continue;
        }

        branches.push(BranchEntry {
            name: name.to_string(),
            is_current,
            is_remote: name.starts_with("remotes/"),
        });
    }

    branches
}

/// Parse `git stash list` output
pub fn parse_stash_list(output: &str) -> Vec<StashEntry> {
    let mut stashes = Vec::new();

    for line in output.lines() {
        // Format: stash@{0}: WIP on main: abc1234 message
        if let Some((index, message)) = line.split_once(": ") {
            stashes.push(StashEntry {
                index: index.trim().to_string(),
                message: message.to_string(),
            });
        }
    }

    stashes
}

/// Parse `git tag -l` output
pub fn parse_tag_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Git quotes paths containing special characters
fn unquote(path: &str) -> String {
    let path = path.trim();
    if path.len() >= 2 && path.starts_with('"') && path.ends_with('"') {
        path[1..path.len() - 1].replace("\\\"", "\"").replace("\\\\", "\\")
    } else {
        path.to_string()
    }
}

/// Represents a file status entry from git status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub status: FileStatus,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_path: Option<String>,
    pub staged: bool,
    pub unstaged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    Untracked,
    Ignored,
    Conflicted,
    Unknown,
}

impl FileStatus {
    fn from_codes(x: char, y: char) -> Self {
        match (x, y) {
            ('?', '?') => FileStatus::Untracked,
            ('!', '!') => FileStatus::Ignored,
            ('U', _) | (_, 'U') | ('A', 'A') | ('D', 'D') => FileStatus::Conflicted,
            ('R', _) | (_, 'R') => FileStatus::Renamed,
            ('C', _) | (_, 'C') => FileStatus::Copied,
            ('A', _) | (_, 'A') => FileStatus::Added,
            ('D', _) | (_, 'D') => FileStatus::Deleted,
            ('M', _) | (_, 'M') | ('T', _) | (_, 'T') => FileStatus::Modified,
            _ => FileStatus::Unknown,
        }
    }
}

/// Represents a commit from git log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitEntry {
    pub hash: String,
    pub author: String,
    pub email: String,
    pub date: String,
    pub message: String,
}

/// Represents a branch from git branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchEntry {
    pub name: String,
    pub is_current: bool,
    pub is_remote: bool,
}

/// Represents a stash entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StashEntry {
    pub index: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_modified_staged() {
        let entries = parse_status_porcelain("M  README.md");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "README.md");
        assert_eq!(entries[0].status, FileStatus::Modified);
        assert!(entries[0].staged);
        assert!(!entries[0].unstaged);
    }

    #[test]
    fn test_parse_status_modified_unstaged() {
        let entries = parse_status_porcelain(" M src/main.rs");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "src/main.rs");
        assert!(!entries[0].staged);
        assert!(entries[0].unstaged);
    }

    #[test]
    fn test_parse_status_untracked() {
        let entries = parse_status_porcelain("?? notes/todo list.txt");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "notes/todo list.txt");
        assert_eq!(entries[0].status, FileStatus::Untracked);
        assert!(!entries[0].staged);
        assert!(!entries[0].unstaged);
    }

    #[test]
    fn test_parse_status_rename() {
        let entries = parse_status_porcelain("R  old.rs -> new.rs");

        assert_eq!(entries[0].status, FileStatus::Renamed);
        assert_eq!(entries[0].path, "new.rs");
        assert_eq!(entries[0].original_path.as_deref(), Some("old.rs"));
    }

    #[test]
    fn test_parse_status_conflict_and_quoted_path() {
        let entries = parse_status_porcelain("UU src/lib.rs\nA  \"with \\\"quote\\\".txt\"");

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].status, FileStatus::Conflicted);
        assert_eq!(entries[1].status, FileStatus::Added);
        assert_eq!(entries[1].path, "with \"quote\".txt");
    }

    #[test]
    fn test_parse_log() {
        let output = "abc123|Alice|alice@example.com|Mon Jan 1 10:00:00 2024 +0000|Initial commit\n\
                      def456|Bob|bob@example.com|Tue Jan 2 10:00:00 2024 +0000|Fix a|b parsing";
        let commits = parse_log(output);

        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].hash, "abc123");
        assert_eq!(commits[0].author, "Alice");
        assert_eq!(commits[0].email, "alice@example.com");
        assert_eq!(commits[0].message, "Initial commit");
        assert_eq!(commits[1].message, "Fix a|b parsing");
    }

    #[test]
    fn test_parse_log_short_line() {
        let commits = parse_log("abc123");

        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].hash, "abc123");
        assert_eq!(commits[0].message, "");
    }

    #[test]
    fn test_parse_branch_list() {
        let output = "* main\n  feature-x\n  remotes/origin/HEAD -> origin/main\n  remotes/origin/main";
        let branches = parse_branch_list(output);

        assert_eq!(branches.len(), 3);
        assert_eq!(branches[0].name, "main");
        assert!(branches[0].is_current);
        assert!(!branches[1].is_current);
        assert_eq!(branches[2].name, "remotes/origin/main");
        assert!(branches[2].is_remote);
    }

    #[test]
    fn test_parse_stash_list() {
        let output = "stash@{0}: WIP on main: abc1234 Work in progress\nstash@{1}: On main: saved";
        let stashes = parse_stash_list(output);

        assert_eq!(stashes.len(), 2);
        assert_eq!(stashes[0].index, "stash@{0}");
        assert_eq!(stashes[0].message, "WIP on main: abc1234 Work in progress");
        assert_eq!(stashes[1].message, "On main: saved");
    }

    #[test]
    fn test_parse_tag_list() {
        assert_eq!(parse_tag_list("v1.0.0\n\nv1.1.0\n"), vec!["v1.0.0", "v1.1.0"]);
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_status_porcelain("").is_empty());
        assert!(parse_log("").is_empty());
        assert!(parse_branch_list("").is_empty());
        assert!(parse_stash_list("").is_empty());
    }
}
