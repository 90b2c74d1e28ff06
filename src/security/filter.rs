use crate::security::DENIED_COMMAND_FRAGMENTS;

/// Denylist check applied to free-form commands before anything is spawned
#[derive(Debug, Clone)]
pub struct CommandFilter {
    denied: Vec<String>,
}

impl CommandFilter {
    pub fn new() -> Self {
        Self::with_fragments(DENIED_COMMAND_FRAGMENTS.iter().copied())
    }

    /// Filter with a custom fragment list
    pub fn with_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let denied = fragments
            .into_iter()
            .map(|fragment| fragment.as_ref().to_lowercase())
            .filter(|fragment| !fragment.is_empty())
            .collect();

        Self { denied }
    }

    /// True when the command may run
    pub fn check(&self, command: &str) -> bool {
        self.violation(command).is_none()
    }

    /// The first denied fragment found in the command, if any
    pub fn violation(&self, command: &str) -> Option<&str> {
        let lowered = command.to_lowercase();
        self.denied
            .iter()
            .find(|fragment| lowered.contains(fragment.as_str()))
            .map(String::as_str)
    }
}

impl Default for CommandFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_denied_fragments() {
        let filter = CommandFilter::new();

        assert!(!filter.check("rm -rf ."));
        assert!(!filter.check("git rm --cached secrets.env"));
        assert!(!filter.check("clean -fd"));
        assert!(!filter.check("git clean -fdx"));
        assert!(!filter.check("reset --hard HEAD~3"));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let filter = CommandFilter::new();

        assert!(!filter.check("RM -rf ."));
        assert!(!filter.check("Clean -FD"));
        assert!(!filter.check("git RESET --HARD head~1"));
    }

    #[test]
    fn test_accepts_everything_else() {
        let filter = CommandFilter::new();

        for command in [
            "status",
            "git status -s",
            "log --oneline -n 5",
            "clean -n",
            "reset --hard HEAD",
            "reset --soft HEAD~1",
            "remote -v",
            "commit -m \"normal message\"",
        ] {
            assert!(filter.check(command), "should be allowed: {}", command);
        }
    }

    #[test]
    fn test_violation_reports_fragment() {
        let filter = CommandFilter::new();
        assert_eq!(filter.violation("git clean -fd"), Some("clean -fd"));
        assert_eq!(filter.violation("status"), None);
    }

    #[test]
    fn test_custom_fragments() {
        let filter = CommandFilter::with_fragments(["push --force", ""]);
        assert!(!filter.check("push --force origin main"));
        assert!(filter.check("rm -rf ."));
    }
}
