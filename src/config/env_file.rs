use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvFileError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse environment file: {0}")]
    Parse(#[from] dotenvy::Error),

    #[error("Invalid variable name: {0}")]
    InvalidKey(String),
}

/// Line-preserving editor for a `.env` file.
///
/// Updates rewrite only the lines that assign the key being set; comments,
/// ordering and unrelated variables are kept byte-for-byte.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
    lines: Vec<String>,
}

impl EnvFile {
    /// Read `path`; a missing file starts out empty
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EnvFileError> {
        let path = path.as_ref().to_path_buf();
        let lines = match fs::read_to_string(&path) {
            Ok(contents) => contents.lines().map(str::to_string).collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(EnvFileError::Io { path, source }),
        };

        Ok(Self { path, lines })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every variable as dotenv parsing sees it
    pub fn values(&self) -> Result<BTreeMap<String, String>, EnvFileError> {
        let contents = self.render();
        let mut values = BTreeMap::new();
        for item in dotenvy::from_read_iter(contents.as_bytes()) {
            let (key, value) = item?;
            values.insert(key, value);
        }
        Ok(values)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, EnvFileError> {
        Ok(self.values()?.remove(key))
    }

    /// Replace every `KEY=` assignment, or append one when absent
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), EnvFileError> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(EnvFileError::InvalidKey(key.to_string()));
        }

        let assignment = format!("{}={}", key, quote_value(value));
        let mut replaced = false;

        for line in self.lines.iter_mut() {
            if assigns(line, key) {
                *line = assignment.clone();
                replaced = true;
            }
        }

        if !replaced {
            self.lines.push(assignment);
        }

        Ok(())
    }

    /// Write the file back with owner-only permissions
    pub fn save(&self) -> Result<(), EnvFileError> {
        let io_err = |source: io::Error| EnvFileError::Io {
            path: self.path.clone(),
            source,
        };

        fs::write(&self.path, self.render()).map_err(io_err)?;

        // Set permissions to 600 (owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path).map_err(io_err)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms).map_err(io_err)?;
        }

        Ok(())
    }

    fn render(&self) -> String {
        let mut contents = self.lines.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        contents
    }
}

/// True for `KEY=...` and `export KEY=...`
fn assigns(line: &str, key: &str) -> bool {
    let line = line.trim_start();
    let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
    line.strip_prefix(key)
        .is_some_and(|rest| rest.trim_start().starts_with('='))
}

/// Quote a value so dotenv reads it back unchanged.
///
/// Single quotes are literal and preferred; values containing `'` are double
/// quoted with `\`, `"` and `$` escaped.
pub fn quote_value(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
