use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Append-only record of every process the panel ran or refused to run.
///
/// Entries carry already-redacted command lines; the logger never sees a
/// credential-bearing URL.
pub struct AuditLogger {
    log_path: PathBuf,
    // Serializes rotate-then-append across request threads
    write_lock: Mutex<()>,
}

impl AuditLogger {
    /// Create an AuditLogger writing to `path`
    pub fn with_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let log_path = path.as_ref().to_path_buf();

        // Ensure directory exists
        if let Some(parent) = log_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        Ok(Self {
            log_path,
            write_lock: Mutex::new(()),
        })
    }

    /// Log a command execution. `exit_code` is `None` for launch failures
    /// and timeouts.
    pub fn log_command(
        &self,
        command: &str,
        repo_path: &Path,
        exit_code: Option<i32>,
    ) -> std::io::Result<()> {
        let exit = match exit_code {
            Some(code) => code.to_string(),
            None => "none".to_string(),
        };

        self.append(&format!(
            "[{}] [{}] [{}] [exit:{}] {}\n",
            Utc::now().to_rfc3339(),
            current_user(),
            repo_path.display(),
            exit,
            command
        ))
    }

    /// Log a custom command refused by the safety filter
    pub fn log_rejection(
        &self,
        command: &str,
        reason: &str,
        repo_path: &Path,
    ) -> std::io::Result<()> {
        self.append(&format!(
            "[{}] [{}] [{}] [REJECTED] command=\"{}\" reason=\"{}\"\n",
            Utc::now().to_rfc3339(),
            current_user(),
            repo_path.display(),
            command,
            reason
        ))
    }

    fn append(&self, entry: &str) -> std::io::Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        self.rotate_if_needed()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        file.write_all(entry.as_bytes())?;
        file.flush()
    }

    /// Rotate log file if it exceeds MAX_LOG_SIZE
    fn rotate_if_needed(&self) -> std::io::Result<()> {
        if !self.log_path.exists() {
            return Ok(());
        }

        let metadata = fs::metadata(&self.log_path)?;
        if metadata.len() > MAX_LOG_SIZE {
            // audit.log -> audit.log.1
            fs::rename(&self.log_path, self.backup_path())?;
        }

        Ok(())
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.log_path.as_os_str().to_os_string();
        name.push(".1");
        PathBuf::from(name)
    }

    /// Get the path to the log file
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
