use crate::api::validation::is_valid_email;
use crate::git::{Credentials, Identity};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load environment file: {0}")]
    EnvFile(#[from] dotenvy::Error),

    #[error("Failed to determine working directory: {0}")]
    WorkingDirectory(#[from] std::io::Error),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// Every setting is read from a `GIT_MANAGER_*` environment variable
pub const ENV_PREFIX: &str = "GIT_MANAGER_";

/// Runtime configuration of the panel
#[derive(Clone)]
pub struct Settings {
    /// HTTPS username for remote operations
    pub username: String,
    /// Personal access token paired with `username`
    pub token: String,
    /// Fallback author name
    pub user_name: String,
    /// Fallback author email
    pub user_email: String,
    /// Stored access-password hash; empty means "not set up"
    pub access_password: String,
    pub session_duration_minutes: u64,
    pub default_remote: String,
    pub timeout_seconds: u64,
    pub route_prefix: String,
    pub repository_path: PathBuf,
    pub listen_addr: String,
    /// Application CLI prefix for console pass-through (e.g. `php artisan`)
    pub app_command: String,
    pub audit_log: Option<PathBuf>,
    pub session_secret: Option<String>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("username", &self.username)
            .field("token", &mask(&self.token))
            .field("user_name", &self.user_name)
            .field("user_email", &self.user_email)
            .field("access_password", &mask(&self.access_password))
            .field("session_duration_minutes", &self.session_duration_minutes)
            .field("default_remote", &self.default_remote)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("route_prefix", &self.route_prefix)
            .field("repository_path", &self.repository_path)
            .field("listen_addr", &self.listen_addr)
            .field("app_command", &self.app_command)
            .field("audit_log", &self.audit_log)
            .field("session_secret", &self.session_secret.as_deref().map(mask))
            .finish()
    }
}

fn mask(value: &str) -> &'static str {
    if value.is_empty() { "" } else { "***" }
}

impl Settings {
    /// Load settings from the process environment, after merging `env_file`
    /// when it exists. Variables already set in the environment win over the
    /// file.
    pub fn load(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        match env_file {
            Some(path) if path.exists() => {
                dotenvy::from_path(path)?;
            }
            Some(_) => {}
            None => {
                // A missing .env is fine; any other problem is not
                match dotenvy::dotenv() {
                    Ok(_) => {}
                    Err(e) if e.not_found() => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let text = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());
        let number = |name: &str, default: u64| -> Result<u64, ConfigError> {
            match get(name) {
                None => Ok(default),
                Some(raw) if raw.trim().is_empty() => Ok(default),
                Some(raw) => raw.trim().parse().map_err(|_| {
                    ConfigError::InvalidValue(format!("{}{} must be a whole number, got '{}'", ENV_PREFIX, name, raw))
                }),
            }
        };

        let defaults = Self::default_settings()?;
        let repository_path = match get("REPOSITORY_PATH").filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => defaults.repository_path,
        };

        let settings = Settings {
            username: text("USERNAME", ""),
            token: text("TOKEN", ""),
            user_name: text("USER_NAME", &defaults.user_name),
            user_email: text("USER_EMAIL", &defaults.user_email),
            access_password: text("PASSWORD", ""),
            session_duration_minutes: number("SESSION_DURATION", defaults.session_duration_minutes)?,
            default_remote: text("DEFAULT_REMOTE", &defaults.default_remote),
            timeout_seconds: number("TIMEOUT", defaults.timeout_seconds)?,
            route_prefix: text("ROUTE_PREFIX", &defaults.route_prefix)
                .trim_matches('/')
                .to_string(),
            repository_path,
            listen_addr: text("LISTEN", &defaults.listen_addr),
            app_command: text("APP_COMMAND", &defaults.app_command),
            audit_log: get("AUDIT_LOG")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            session_secret: get("SESSION_SECRET").filter(|s| !s.is_empty()),
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Defaults for every setting, rooted at the current directory
    pub fn default_settings() -> Result<Self, ConfigError> {
        Ok(Settings {
            username: String::new(),
            token: String::new(),
            user_name: Identity::default().name,
            user_email: Identity::default().email,
            access_password: String::new(),
            session_duration_minutes: 120,
            default_remote: "origin".to_string(),
            timeout_seconds: 300,
            route_prefix: "git-manager".to_string(),
            repository_path: std::env::current_dir()?,
            listen_addr: "127.0.0.1:8080".to_string(),
            app_command: "php artisan".to_string(),
            audit_log: None,
            session_secret: None,
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "GIT_MANAGER_TIMEOUT must be greater than 0".to_string(),
            ));
        }

        if self.session_duration_minutes == 0 {
            return Err(ConfigError::InvalidValue(
                "GIT_MANAGER_SESSION_DURATION must be greater than 0".to_string(),
            ));
        }

        if self.default_remote.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "GIT_MANAGER_DEFAULT_REMOTE must not be empty".to_string(),
            ));
        }

        // Empty mounts the panel at the root
        if !self
            .route_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/'))
        {
            return Err(ConfigError::InvalidValue(format!(
                "Invalid route prefix: '{}'. Use letters, digits, '-', '_' and '/'",
                self.route_prefix
            )));
        }

        if !self.user_email.is_empty() && !is_valid_email(&self.user_email) {
            return Err(ConfigError::InvalidValue(format!(
                "Invalid GIT_MANAGER_USER_EMAIL: {}",
                self.user_email
            )));
        }

        Ok(())
    }

    /// Credential pair, when both halves are configured
    pub fn credentials(&self) -> Option<Credentials> {
        Credentials::new(self.username.as_str(), self.token.as_str())
    }

    /// Identity written to repositories that have none
    pub fn fallback_identity(&self) -> Identity {
        let defaults = Identity::default();
        Identity {
            name: non_empty_or(&self.user_name, defaults.name),
            email: non_empty_or(&self.user_email, defaults.email),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// False until the setup wizard has stored a password hash
    pub fn has_access_password(&self) -> bool {
        !self.access_password.trim().is_empty()
    }
}

fn non_empty_or(value: &str, fallback: String) -> String {
    if value.trim().is_empty() {
        fallback
    } else {
        value.to_string()
    }
}
