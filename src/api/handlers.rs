use crate::api::requests::{
    AddParams, CheckoutRequest, CommandRequest, CommitRequest, CreateBranchRequest,
    DeleteBranchRequest, DiffRequest, FullPushParams, MergeRequest, MessageRequest,
    RemoteBranchRequest, RemoteRequest, ResetParams, TagRequest, UserConfigRequest,
};
use crate::api::validation::ValidationErrors;
use crate::console::AppConsole;
use crate::git::parser::{
    parse_branch_list, parse_log, parse_stash_list, parse_status_porcelain, parse_tag_list,
};
use crate::git::{ExecutionResult, GitManager, ProcessRunner};
use serde_json::{Map, Value, json};

/// Framework-neutral response: status code plus JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn validation(errors: &ValidationErrors) -> Self {
        Self {
            status: 422,
            body: json!({ "success": false, "errors": errors }),
        }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "success": false, "message": message.into() }),
        }
    }
}

/// Standard envelope for one command result
fn envelope(result: &ExecutionResult, ok: &str, failed: &str) -> Map<String, Value> {
    let message = if result.success { ok } else { failed };
    let mut body = Map::new();
    body.insert("success".into(), json!(result.success));
    body.insert("output".into(), json!(result.output));
    body.insert("error".into(), json!(result.error));
    body.insert("exit_code".into(), json!(result.exit_code));
    body.insert("command".into(), json!(result.command));
    body.insert("message".into(), json!(message));
    body
}

fn respond(result: &ExecutionResult, ok: &str, failed: &str) -> ApiResponse {
    ApiResponse::ok(Value::Object(envelope(result, ok, failed)))
}

/// Envelope plus one parsed field, attached only when the command succeeded
fn respond_with(result: &ExecutionResult, ok: &str, failed: &str, key: &str, parsed: impl FnOnce(&str) -> Value) -> ApiResponse {
    let mut body = envelope(result, ok, failed);
    if result.success {
        body.insert(key.to_string(), parsed(&result.output));
    }
    ApiResponse::ok(Value::Object(body))
}

/// Maps validated requests onto facade calls and facade results onto
/// response bodies. Runs on a blocking thread; never touches HTTP types.
pub struct Controller<R: ProcessRunner> {
    git: GitManager<R>,
    console: AppConsole,
    default_remote: String,
}

impl<R: ProcessRunner> Controller<R> {
    pub fn new(git: GitManager<R>, console: AppConsole, default_remote: impl Into<String>) -> Self {
        Self {
            git,
            console,
            default_remote: default_remote.into(),
        }
    }

    fn remote(&self, remote: Option<String>) -> String {
        remote.unwrap_or_else(|| self.default_remote.clone())
    }

    /// Status plus branch, remotes, parsed changes and identity
    pub fn status(&self) -> ApiResponse {
        let info = self.git.info();
        let porcelain = if info.status.success {
            Some(self.git.changed_files())
        } else {
            None
        };

        let mut body = envelope(&info.status, "Status retrieved", "Failed to get status");
        body.insert("info".into(), json!(info));
        if let Some(porcelain) = porcelain.filter(|p| p.success) {
            body.insert("has_changes".into(), json!(!porcelain.trimmed_output().is_empty()));
            body.insert("files".into(), json!(parse_status_porcelain(&porcelain.output)));
            body.insert("changed_files".into(), json!(porcelain.output));
            body.insert("git_user".into(), json!(self.git.git_user()));
        }
        ApiResponse::ok(Value::Object(body))
    }

    pub fn current_branch(&self) -> ApiResponse {
        let result = self.git.current_branch();
        let mut body = envelope(&result, "Current branch retrieved", "Failed to get current branch");
        body.insert("branch".into(), json!(result.trimmed_output()));
        ApiResponse::ok(Value::Object(body))
    }

    pub fn branches(&self) -> ApiResponse {
        respond_with(
            &self.git.branches(),
            "Branches retrieved",
            "Failed to list branches",
            "branches",
            |out| json!(parse_branch_list(out)),
        )
    }

    pub fn add(&self, params: AddParams) -> ApiResponse {
        respond(&self.git.add(&params.files), "Files staged successfully", "Failed to stage files")
    }

    pub fn commit(&self, params: CommitRequest) -> ApiResponse {
        respond(&self.git.commit(&params.message), "Changes committed successfully", "Commit failed")
    }

    pub fn push(&self, params: RemoteBranchRequest) -> ApiResponse {
        let remote = self.remote(params.remote);
        respond(
            &self.git.push(&remote, params.branch.as_deref(), params.force),
            "Changes pushed successfully",
            "Push failed",
        )
    }

    pub fn pull(&self, params: RemoteBranchRequest) -> ApiResponse {
        let remote = self.remote(params.remote);
        respond(
            &self.git.pull(&remote, params.branch.as_deref()),
            "Changes pulled successfully",
            "Pull failed",
        )
    }

    pub fn fetch(&self, params: RemoteRequest) -> ApiResponse {
        let remote = self.remote(params.remote);
        respond(&self.git.fetch(&remote), "Fetched successfully", "Fetch failed")
    }

    pub fn checkout(&self, params: CheckoutRequest) -> ApiResponse {
        respond(
            &self.git.checkout(&params.branch, params.create),
            &format!("Switched to branch '{}'", params.branch),
            "Checkout failed",
        )
    }

    pub fn merge(&self, params: MergeRequest) -> ApiResponse {
        respond(
            &self.git.merge(&params.branch, params.message.as_deref()),
            &format!("Merged '{}' successfully", params.branch),
            "Merge failed",
        )
    }

    pub fn create_branch(&self, params: CreateBranchRequest) -> ApiResponse {
        respond(
            &self.git.create_branch(&params.name, params.checkout),
            &format!("Branch '{}' created", params.name),
            "Failed to create branch",
        )
    }

    pub fn delete_branch(&self, params: DeleteBranchRequest) -> ApiResponse {
        respond(
            &self.git.delete_branch(&params.name, params.force),
            &format!("Branch '{}' deleted", params.name),
            "Failed to delete branch",
        )
    }

    pub fn log(&self, limit: u32) -> ApiResponse {
        respond_with(
            &self.git.log(limit),
            "Log retrieved",
            "Failed to get log",
            "commits",
            |out| json!(parse_log(out)),
        )
    }

    pub fn diff(&self, params: DiffRequest) -> ApiResponse {
        respond(&self.git.diff(params.file.as_deref()), "Diff retrieved", "Failed to get diff")
    }

    pub fn stash(&self, params: MessageRequest) -> ApiResponse {
        respond(&self.git.stash(params.message.as_deref()), "Changes stashed", "Stash failed")
    }

    pub fn stash_pop(&self) -> ApiResponse {
        respond(&self.git.stash_pop(), "Stash applied", "Stash pop failed")
    }

    pub fn stash_list(&self) -> ApiResponse {
        respond_with(
            &self.git.stash_list(),
            "Stashes retrieved",
            "Failed to list stashes",
            "stashes",
            |out| json!(parse_stash_list(out)),
        )
    }

    pub fn reset(&self, params: ResetParams) -> ApiResponse {
        respond(
            &self.git.reset(params.mode, &params.commit),
            &format!("Reset ({}) to {}", params.mode, params.commit),
            "Reset failed",
        )
    }

    pub fn tags(&self) -> ApiResponse {
        respond_with(
            &self.git.tags(),
            "Tags retrieved",
            "Failed to list tags",
            "tags",
            |out| json!(parse_tag_list(out)),
        )
    }

    pub fn create_tag(&self, params: TagRequest) -> ApiResponse {
        respond(
            &self.git.create_tag(&params.name, params.message.as_deref()),
            &format!("Tag '{}' created", params.name),
            "Failed to create tag",
        )
    }

    pub fn delete_tag(&self, params: TagRequest) -> ApiResponse {
        respond(
            &self.git.delete_tag(&params.name),
            &format!("Tag '{}' deleted", params.name),
            "Failed to delete tag",
        )
    }

    pub fn push_tags(&self, params: RemoteRequest) -> ApiResponse {
        let remote = self.remote(params.remote);
        respond(&self.git.push_tags(&remote), "Tags pushed successfully", "Failed to push tags")
    }

    pub fn full_push(&self, params: FullPushParams) -> ApiResponse {
        let remote = self.remote(params.remote);
        let report = self
            .git
            .full_push(&params.files, &params.message, &remote, params.branch.as_deref());

        ApiResponse::ok(json!({
            "success": report.success,
            "message": report.message,
            "steps": report.steps,
        }))
    }

    pub fn execute_custom(&self, params: CommandRequest) -> ApiResponse {
        respond(
            &self.git.execute_custom(&params.command),
            "Command executed",
            "Command failed",
        )
    }

    pub fn run_app_command(&self, params: CommandRequest) -> ApiResponse {
        respond(
            &self.console.run(self.git.runner(), &params.command),
            "Command executed",
            "Command failed",
        )
    }

    pub fn config_user(&self, params: UserConfigRequest) -> ApiResponse {
        let result = self.git.config_user(&params.name, &params.email, params.global);
        let message = if result.success {
            "Git user configured"
        } else {
            "Failed to configure git user"
        };

        ApiResponse::ok(json!({
            "success": result.success,
            "message": message,
            "name_result": result.name_result,
            "email_result": result.email_result,
        }))
    }

    pub fn git_user(&self) -> ApiResponse {
        let user = self.git.git_user();
        ApiResponse::ok(json!({
            "success": true,
            "name": user.name,
            "email": user.email,
        }))
    }

    pub fn info(&self) -> ApiResponse {
        let info = self.git.info();
        ApiResponse::ok(json!({
            "success": info.status.success,
            "info": info,
            "has_changes": self.git.has_changes(),
        }))
    }
}
