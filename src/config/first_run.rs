use crate::api::validation::is_valid_email;
use crate::auth::{AuthError, MIN_PASSWORD_LENGTH, hash_password, verify_password};
use crate::config::env_file::{EnvFile, EnvFileError};
use crate::config::settings::ENV_PREFIX;
use crate::git::{CommandVector, ExecutionResult, Identity, ProcessRunner};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Environment file error: {0}")]
    EnvFile(#[from] EnvFileError),

    #[error("Password error: {0}")]
    Auth(#[from] AuthError),

    #[error("Setup cancelled by user")]
    Cancelled,

    #[error("No access password is configured. Run setup first.")]
    NotConfigured,

    #[error("Invalid access password")]
    WrongPassword,

    #[error("Unknown option: {0}")]
    UnknownOption(String),
}

/// Setting the `config` command can change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOption {
    Username,
    Token,
    UserName,
    UserEmail,
    Password,
    All,
}

impl FromStr for ConfigOption {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "username" => Ok(ConfigOption::Username),
            "token" => Ok(ConfigOption::Token),
            "user_name" | "name" => Ok(ConfigOption::UserName),
            "user_email" | "email" => Ok(ConfigOption::UserEmail),
            "password" => Ok(ConfigOption::Password),
            "all" => Ok(ConfigOption::All),
            other => Err(SetupError::UnknownOption(other.to_string())),
        }
    }
}

/// What the wizard collected, for steps the caller performs afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupOutcome {
    pub identity: Identity,
    pub configure_global_identity: bool,
}

fn key(name: &str) -> String {
    format!("{}{}", ENV_PREFIX, name)
}

/// Reads one secret answer given its prompt text
type SecretReader = Box<dyn FnMut(&str) -> io::Result<String>>;

/// Interactive terminal setup, generic over its input and output so tests
/// can script it.
///
/// Tokens and passwords come from `input` like every other answer unless a
/// secret reader is installed; [`with_hidden_secrets`](Self::with_hidden_secrets)
/// reads them from the terminal without echo.
pub struct SetupWizard<I, O> {
    input: I,
    output: O,
    secret_reader: Option<SecretReader>,
}

impl<I: BufRead, O: Write> SetupWizard<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self {
            input,
            output,
            secret_reader: None,
        }
    }

    /// Read tokens and passwords from the controlling terminal with echo off
    pub fn with_hidden_secrets(self) -> Self {
        self.with_secret_reader(|prompt| rpassword::prompt_password(prompt))
    }

    pub fn with_secret_reader<F>(mut self, reader: F) -> Self
    where
        F: FnMut(&str) -> io::Result<String> + 'static,
    {
        self.secret_reader = Some(Box::new(reader));
        self
    }

    /// First-time setup: collect credentials, identity and the access
    /// password, then write them to `env`.
    pub fn run(&mut self, env: &mut EnvFile) -> Result<SetupOutcome, SetupError> {
        self.banner("Git Manager Setup")?;

        let existing = |name: &str| -> Result<String, SetupError> {
            Ok(env.get(&key(name))?.unwrap_or_default())
        };

        let current_username = existing("USERNAME")?;
        let current_token = existing("TOKEN")?;
        let current_password = existing("PASSWORD")?;

        if !current_username.is_empty() && !current_token.is_empty() && !current_password.is_empty() {
            writeln!(self.output, "Git Manager is already configured.")?;
            if !self.confirm("Reconfigure everything?", false)? {
                return Err(SetupError::Cancelled);
            }
        }

        let current_name = existing("USER_NAME")?;
        let current_email = existing("USER_EMAIL")?;

        let username = self.prompt_username(non_empty(&current_username))?;
        let token = self.prompt_token()?;
        let identity = Identity {
            name: self.prompt_name(non_empty(&current_name))?,
            email: self.prompt_email(non_empty(&current_email))?,
        };
        let password = self.prompt_new_password()?;

        env.set(&key("USERNAME"), &username)?;
        env.set(&key("TOKEN"), &token)?;
        env.set(&key("USER_NAME"), &identity.name)?;
        env.set(&key("USER_EMAIL"), &identity.email)?;
        env.set(&key("PASSWORD"), &hash_password(&password)?)?;
        env.save()?;

        writeln!(self.output, "\n✓ Configuration saved to {}", env.path().display())?;

        let configure_global_identity = self.confirm("Also set this identity in your global git config?", true)?;

        Ok(SetupOutcome {
            identity,
            configure_global_identity,
        })
    }

    /// Change one setting, or all of them, after re-entering the access
    /// password.
    pub fn update(&mut self, env: &mut EnvFile, option: Option<ConfigOption>) -> Result<(), SetupError> {
        let stored = env.get(&key("PASSWORD"))?.unwrap_or_default();
        if stored.trim().is_empty() {
            return Err(SetupError::NotConfigured);
        }

        let attempt = self.prompt_secret("Current access password")?;
        if !verify_password(&attempt, &stored)? {
            return Err(SetupError::WrongPassword);
        }

        let option = match option {
            Some(option) => option,
            None => self.choose_option()?,
        };

        let current = |name: &str| -> Result<String, SetupError> {
            Ok(env.get(&key(name))?.unwrap_or_default())
        };

        match option {
            ConfigOption::Username => {
                let username = self.prompt_username(non_empty(&current("USERNAME")?))?;
                env.set(&key("USERNAME"), &username)?;
            }
            ConfigOption::Token => {
                let token = self.prompt_token()?;
                env.set(&key("TOKEN"), &token)?;
            }
            ConfigOption::UserName => {
                let name = self.prompt_name(non_empty(&current("USER_NAME")?))?;
                env.set(&key("USER_NAME"), &name)?;
            }
            ConfigOption::UserEmail => {
                let email = self.prompt_email(non_empty(&current("USER_EMAIL")?))?;
                env.set(&key("USER_EMAIL"), &email)?;
            }
            ConfigOption::Password => {
                let password = self.prompt_new_password()?;
                env.set(&key("PASSWORD"), &hash_password(&password)?)?;
            }
            ConfigOption::All => {
                let username = self.prompt_username(non_empty(&current("USERNAME")?))?;
                let token = self.prompt_token()?;
                let name = self.prompt_name(non_empty(&current("USER_NAME")?))?;
                let email = self.prompt_email(non_empty(&current("USER_EMAIL")?))?;
                let password = self.prompt_new_password()?;

                env.set(&key("USERNAME"), &username)?;
                env.set(&key("TOKEN"), &token)?;
                env.set(&key("USER_NAME"), &name)?;
                env.set(&key("USER_EMAIL"), &email)?;
                env.set(&key("PASSWORD"), &hash_password(&password)?)?;
            }
        }

        env.save()?;
        writeln!(self.output, "\n✓ Configuration updated")?;
        Ok(())
    }

    fn choose_option(&mut self) -> Result<ConfigOption, SetupError> {
        loop {
            writeln!(self.output, "\nWhat would you like to change?")?;
            writeln!(self.output, "  [1] Git username")?;
            writeln!(self.output, "  [2] Access token")?;
            writeln!(self.output, "  [3] Author name")?;
            writeln!(self.output, "  [4] Author email")?;
            writeln!(self.output, "  [5] Access password")?;
            writeln!(self.output, "  [6] All of the above")?;

            let choice = self.prompt("Enter your choice [1-6]", None)?;
            let option = match choice.as_str() {
                "1" => ConfigOption::Username,
                "2" => ConfigOption::Token,
                "3" => ConfigOption::UserName,
                "4" => ConfigOption::UserEmail,
                "5" => ConfigOption::Password,
                "6" => ConfigOption::All,
                _ => {
                    writeln!(self.output, "⚠️  Invalid choice. Please enter 1-6.")?;
                    continue;
                }
            };
            return Ok(option);
        }
    }

    fn prompt_username(&mut self, default: Option<&str>) -> Result<String, SetupError> {
        self.prompt_required("Git username", default)
    }

    fn prompt_token(&mut self) -> Result<String, SetupError> {
        loop {
            let token = self.prompt_secret("Personal access token")?;
            if !token.is_empty() {
                return Ok(token);
            }
            writeln!(self.output, "⚠️  Personal access token cannot be empty.")?;
        }
    }

    fn prompt_name(&mut self, default: Option<&str>) -> Result<String, SetupError> {
        let fallback = Identity::default().name;
        self.prompt_required("Author name", default.or(Some(fallback.as_str())))
    }

    fn prompt_email(&mut self, default: Option<&str>) -> Result<String, SetupError> {
        let fallback = Identity::default().email;
        loop {
            let email = self.prompt_required("Author email", default.or(Some(fallback.as_str())))?;
            if is_valid_email(&email) {
                return Ok(email);
            }
            writeln!(self.output, "⚠️  Please enter a valid email address.")?;
        }
    }

    fn prompt_new_password(&mut self) -> Result<String, SetupError> {
        loop {
            let password = self.prompt_secret("Access password for the web panel")?;
            if password.chars().count() < MIN_PASSWORD_LENGTH {
                writeln!(
                    self.output,
                    "⚠️  Password must be at least {} characters.",
                    MIN_PASSWORD_LENGTH
                )?;
                continue;
            }

            let confirmation = self.prompt_secret("Confirm access password")?;
            if confirmation != password {
                writeln!(self.output, "⚠️  Passwords do not match.")?;
                continue;
            }

            return Ok(password);
        }
    }

    fn prompt_required(&mut self, label: &str, default: Option<&str>) -> Result<String, SetupError> {
        loop {
            let value = self.prompt(label, default)?;
            if !value.is_empty() {
                return Ok(value);
            }
            writeln!(self.output, "⚠️  {} cannot be empty.", label)?;
        }
    }

    /// Read one trimmed line; an empty answer takes `default`
    fn prompt(&mut self, label: &str, default: Option<&str>) -> Result<String, SetupError> {
        match default {
            Some(default) => write!(self.output, "{} [{}]: ", label, default)?,
            None => write!(self.output, "{}: ", label)?,
        }
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(SetupError::Cancelled);
        }

        let answer = line.trim();
        if answer.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer.to_string())
        }
    }

    fn prompt_secret(&mut self, label: &str) -> Result<String, SetupError> {
        if self.secret_reader.is_none() {
            return self.prompt(label, None);
        }
        self.output.flush()?;

        let prompt = format!("{}: ", label);
        let answer = match self.secret_reader.as_mut() {
            Some(read) => read(&prompt)?,
            None => String::new(),
        };
        Ok(answer.trim().to_string())
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool, SetupError> {
        let hint = if default { "Y/n" } else { "y/N" };
        let answer = self.prompt(&format!("{} [{}]", question, hint), None)?;
        Ok(match answer.to_lowercase().as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => default,
        })
    }

    fn banner(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.output, "\n{}", "=".repeat(60))?;
        writeln!(self.output, "  {}", title)?;
        writeln!(self.output, "{}", "=".repeat(60))
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

/// Write the identity to the user's global git config; both results are
/// returned so the caller can report each one.
pub fn configure_global_identity<R: ProcessRunner + ?Sized>(
    runner: &R,
    binary: &str,
    work_dir: &Path,
    identity: &Identity,
) -> (ExecutionResult, ExecutionResult) {
    let timeout = Duration::from_secs(30);
    let set = |key: &str, value: &str| {
        let command = CommandVector::new(binary).args(["config", "--global", key, value]);
        runner.run(&command, work_dir, &[], timeout)
    };

    (set("user.name", &identity.name), set("user.email", &identity.email))
}
