//! Typed request bodies for every operation, validated before any git
//! context is built.

use crate::api::validation::{ValidationErrors, is_valid_email};
use crate::git::ResetMode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Largest `limit` accepted by the log endpoint
pub const MAX_LOG_LIMIT: u32 = 1000;
pub const DEFAULT_LOG_LIMIT: u32 = 10;

/// A request body that checks itself into its validated form
pub trait ApiRequest: DeserializeOwned {
    type Valid;

    fn validate(self) -> Result<Self::Valid, ValidationErrors>;
}

/// Deserialize and validate a JSON body; a missing body counts as `{}`
pub fn parse<T: ApiRequest>(body: Value) -> Result<T::Valid, ValidationErrors> {
    let body = if body.is_null() {
        Value::Object(Default::default())
    } else {
        body
    };

    let request: T = serde_json::from_value(body)
        .map_err(|e| ValidationErrors::single("request", format!("Malformed request body: {}", e)))?;
    request.validate()
}

/// One pathspec or a list of them
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FileSpec {
    One(String),
    Many(Vec<String>),
}

impl FileSpec {
    /// Non-blank paths; empty means "everything"
    fn into_paths(self) -> Vec<String> {
        let paths = match self {
            FileSpec::One(path) => vec![path],
            FileSpec::Many(paths) => paths,
        };
        paths
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }
}

fn paths(files: Option<FileSpec>) -> Vec<String> {
    files.map(FileSpec::into_paths).unwrap_or_default()
}

/// Blank optional strings are treated as absent
fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddRequest {
    pub files: Option<FileSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddParams {
    pub files: Vec<String>,
}

impl ApiRequest for AddRequest {
    type Valid = AddParams;

    fn validate(self) -> Result<AddParams, ValidationErrors> {
        Ok(AddParams {
            files: paths(self.files),
        })
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CommitRequest {
    #[serde(default)]
    pub message: String,
}

impl ApiRequest for CommitRequest {
    type Valid = Self;

    fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("message", &self.message);
        errors.into_result(self)
    }
}

/// Remote and branch shared by push and pull
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
pub struct RemoteBranchRequest {
    pub remote: Option<String>,
    pub branch: Option<String>,
    #[serde(default)]
    pub force: bool,
}

impl ApiRequest for RemoteBranchRequest {
    type Valid = Self;

    fn validate(self) -> Result<Self, ValidationErrors> {
        let remote = present(self.remote);
        let branch = present(self.branch);

        let mut errors = ValidationErrors::new();
        if let Some(remote) = &remote {
            errors.reject_option_like("remote", remote);
        }
        if let Some(branch) = &branch {
            errors.reject_option_like("branch", branch);
        }

        errors.into_result(Self {
            remote,
            branch,
            force: self.force,
        })
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
pub struct RemoteRequest {
    pub remote: Option<String>,
}

impl ApiRequest for RemoteRequest {
    type Valid = Self;

    fn validate(self) -> Result<Self, ValidationErrors> {
        let remote = present(self.remote);
        let mut errors = ValidationErrors::new();
        if let Some(remote) = &remote {
            errors.reject_option_like("remote", remote);
        }
        errors.into_result(Self { remote })
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub create: bool,
}

impl ApiRequest for CheckoutRequest {
    type Valid = Self;

    fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("branch", &self.branch);
        errors.reject_option_like("branch", &self.branch);
        errors.into_result(self)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MergeRequest {
    #[serde(default)]
    pub branch: String,
    pub message: Option<String>,
}

impl ApiRequest for MergeRequest {
    type Valid = Self;

    fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("branch", &self.branch);
        errors.reject_option_like("branch", &self.branch);
        errors.into_result(Self {
            message: present(self.message),
            ..self
        })
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CreateBranchRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub checkout: bool,
}

fn default_true() -> bool {
    true
}

impl ApiRequest for CreateBranchRequest {
    type Valid = Self;

    fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name);
        errors.reject_option_like("name", &self.name);
        errors.into_result(self)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DeleteBranchRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub force: bool,
}

impl ApiRequest for DeleteBranchRequest {
    type Valid = Self;

    fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name);
        errors.reject_option_like("name", &self.name);
        errors.into_result(self)
    }
}

/// Query strings arrive as text, JSON bodies as numbers
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LimitValue {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogRequest {
    pub limit: Option<LimitValue>,
}

impl ApiRequest for LogRequest {
    type Valid = u32;

    fn validate(self) -> Result<u32, ValidationErrors> {
        let limit = match self.limit {
            None => return Ok(DEFAULT_LOG_LIMIT),
            Some(LimitValue::Text(text)) if text.trim().is_empty() => return Ok(DEFAULT_LOG_LIMIT),
            Some(LimitValue::Number(n)) => Some(n),
            Some(LimitValue::Text(text)) => text.trim().parse::<i64>().ok(),
        };

        match limit {
            Some(n) if (1..=i64::from(MAX_LOG_LIMIT)).contains(&n) => Ok(n as u32),
            _ => Err(ValidationErrors::single(
                "limit",
                format!("The limit must be an integer between 1 and {}.", MAX_LOG_LIMIT),
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
pub struct DiffRequest {
    pub file: Option<String>,
}

impl ApiRequest for DiffRequest {
    type Valid = Self;

    fn validate(self) -> Result<Self, ValidationErrors> {
        Ok(Self {
            file: present(self.file),
        })
    }
}

/// Optional free-text message (stash)
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
pub struct MessageRequest {
    pub message: Option<String>,
}

impl ApiRequest for MessageRequest {
    type Valid = Self;

    fn validate(self) -> Result<Self, ValidationErrors> {
        Ok(Self {
            message: present(self.message),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetRequest {
    pub mode: Option<String>,
    pub commit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetParams {
    pub mode: ResetMode,
    pub commit: String,
}

impl ApiRequest for ResetRequest {
    type Valid = ResetParams;

    fn validate(self) -> Result<ResetParams, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let mode = match present(self.mode) {
            None => ResetMode::default(),
            Some(mode) => mode.parse().unwrap_or_else(|_| {
                errors.add("mode", "The selected mode is invalid. Use soft, mixed or hard.");
                ResetMode::default()
            }),
        };

        let commit = present(self.commit).unwrap_or_else(|| "HEAD".to_string());
        errors.reject_option_like("commit", &commit);

        errors.into_result(ResetParams { mode, commit })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FullPushRequest {
    #[serde(default)]
    pub message: String,
    pub files: Option<FileSpec>,
    pub remote: Option<String>,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullPushParams {
    pub message: String,
    pub files: Vec<String>,
    pub remote: Option<String>,
    pub branch: Option<String>,
}

impl ApiRequest for FullPushRequest {
    type Valid = FullPushParams;

    fn validate(self) -> Result<FullPushParams, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("message", &self.message);

        let remote = present(self.remote);
        let branch = present(self.branch);
        if let Some(remote) = &remote {
            errors.reject_option_like("remote", remote);
        }
        if let Some(branch) = &branch {
            errors.reject_option_like("branch", branch);
        }

        errors.into_result(FullPushParams {
            message: self.message,
            files: paths(self.files),
            remote,
            branch,
        })
    }
}

/// Free-form command for the git or application console
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CommandRequest {
    #[serde(default)]
    pub command: String,
}

impl ApiRequest for CommandRequest {
    type Valid = Self;

    fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("command", &self.command);
        errors.into_result(self)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UserConfigRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub global: bool,
}

impl ApiRequest for UserConfigRequest {
    type Valid = Self;

    fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name);
        errors.require("email", &self.email);
        if !self.email.trim().is_empty() && !is_valid_email(self.email.trim()) {
            errors.add("email", "The email must be a valid email address.");
        }
        errors.into_result(Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            global: self.global,
        })
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TagRequest {
    #[serde(default)]
    pub name: String,
    pub message: Option<String>,
}

impl ApiRequest for TagRequest {
    type Valid = Self;

    fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name);
        errors.reject_option_like("name", &self.name);
        errors.into_result(Self {
            message: present(self.message),
            ..self
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticateRequest {
    #[serde(default)]
    pub password: String,
}

impl ApiRequest for AuthenticateRequest {
    type Valid = String;

    fn validate(self) -> Result<String, ValidationErrors> {
        if self.password.is_empty() {
            return Err(ValidationErrors::single("password", "The password field is required."));
        }
        Ok(self.password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_body_is_empty_object() {
        let params = parse::<AddRequest>(Value::Null).unwrap();
        assert!(params.files.is_empty());
    }

    #[test]
    fn test_files_accepts_string_or_list() {
        let one = parse::<AddRequest>(json!({"files": "src/main.rs"})).unwrap();
        assert_eq!(one.files, vec!["src/main.rs"]);

        let many = parse::<AddRequest>(json!({"files": ["a.txt", " ", "b.txt"]})).unwrap();
        assert_eq!(many.files, vec!["a.txt", "b.txt"]);

        let blank = parse::<AddRequest>(json!({"files": ""})).unwrap();
        assert!(blank.files.is_empty());
    }

    #[test]
    fn test_commit_requires_message() {
        let errors = parse::<CommitRequest>(json!({})).unwrap_err();
        assert!(errors.has("message"));

        let errors = parse::<CommitRequest>(json!({"message": "   "})).unwrap_err();
        assert!(errors.has("message"));

        assert!(parse::<CommitRequest>(json!({"message": "Fix"})).is_ok());
    }

    #[test]
    fn test_wrong_type_is_request_error() {
        let errors = parse::<CommitRequest>(json!({"message": 42})).unwrap_err();
        assert!(errors.has("request"));
    }

    #[test]
    fn test_option_like_refs_rejected() {
        let errors = parse::<RemoteBranchRequest>(json!({"remote": "--upload-pack=x"})).unwrap_err();
        assert!(errors.has("remote"));

        let errors = parse::<CheckoutRequest>(json!({"branch": "-b"})).unwrap_err();
        assert!(errors.has("branch"));

        let errors = parse::<TagRequest>(json!({"name": "--delete"})).unwrap_err();
        assert!(errors.has("name"));
    }

    #[test]
    fn test_push_defaults() {
        let params = parse::<RemoteBranchRequest>(json!({"branch": ""})).unwrap();
        assert_eq!(params, RemoteBranchRequest::default());
    }

    #[test]
    fn test_create_branch_checks_out_by_default() {
        let params = parse::<CreateBranchRequest>(json!({"name": "feature"})).unwrap();
        assert!(params.checkout);
    }

    #[test]
    fn test_log_limit_bounds() {
        assert_eq!(parse::<LogRequest>(json!({})).unwrap(), 10);
        assert_eq!(parse::<LogRequest>(json!({"limit": "25"})).unwrap(), 25);
        assert_eq!(parse::<LogRequest>(json!({"limit": 1000})).unwrap(), 1000);
        assert!(parse::<LogRequest>(json!({"limit": 0})).is_err());
        assert!(parse::<LogRequest>(json!({"limit": "1001"})).is_err());
        assert!(parse::<LogRequest>(json!({"limit": "ten"})).is_err());
    }

    #[test]
    fn test_reset_mode_validation() {
        let params = parse::<ResetRequest>(json!({})).unwrap();
        assert_eq!(params.mode, ResetMode::Hard);
        assert_eq!(params.commit, "HEAD");

        let errors = parse::<ResetRequest>(json!({"mode": "delete-everything"})).unwrap_err();
        assert!(errors.has("mode"));

        let params = parse::<ResetRequest>(json!({"mode": "soft", "commit": "HEAD~1"})).unwrap();
        assert_eq!(params.mode, ResetMode::Soft);
        assert_eq!(params.commit, "HEAD~1");
    }

    #[test]
    fn test_user_config_email() {
        let errors = parse::<UserConfigRequest>(json!({"name": "Jane", "email": "nope"})).unwrap_err();
        assert!(errors.has("email"));
        assert!(!errors.has("name"));

        let params = parse::<UserConfigRequest>(json!({"name": " Jane ", "email": "jane@example.com"})).unwrap();
        assert_eq!(params.name, "Jane");
        assert!(!params.global);
    }

    #[test]
    fn test_full_push_collects_all_errors() {
        let errors = parse::<FullPushRequest>(json!({"branch": "--all"})).unwrap_err();
        assert!(errors.has("message"));
        assert!(errors.has("branch"));
    }
}
