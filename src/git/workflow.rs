use crate::git::executor::{ExecutionResult, ProcessRunner};
use crate::git::manager::GitManager;
use serde::Serialize;

/// Trace entry for one stage of a composite operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub step: String,
    pub success: bool,
    pub output: String,
    pub error: String,
}

impl StepResult {
    fn from_result(step: &str, result: &ExecutionResult) -> Self {
        Self {
            step: step.to_string(),
            success: result.success,
            output: result.output.clone(),
            error: result.error.clone(),
        }
    }
}

/// Outcome of a composite operation; `steps` lists the stages that ran
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub success: bool,
    pub message: String,
    pub steps: Vec<StepResult>,
}

impl<R: ProcessRunner> GitManager<R> {
    /// add, then commit, then push, stopping at the first failure
    pub fn full_push<S: AsRef<str>>(
        &self,
        files: &[S],
        message: &str,
        remote: &str,
        branch: Option<&str>,
    ) -> WorkflowReport {
        let mut steps = Vec::new();

        let add = self.add(files);
        steps.push(StepResult::from_result("add", &add));
        if !add.success {
            return WorkflowReport::failed_at("add", steps);
        }

        let commit = self.commit(message);
        steps.push(StepResult::from_result("commit", &commit));
        if !commit.success {
            return WorkflowReport::failed_at("commit", steps);
        }

        let push = self.push(remote, branch, false);
        steps.push(StepResult::from_result("push", &push));
        if !push.success {
            return WorkflowReport::failed_at("push", steps);
        }

        WorkflowReport {
            success: true,
            message: "All steps completed successfully".to_string(),
            steps,
        }
    }
}

impl WorkflowReport {
    fn failed_at(stage: &str, steps: Vec<StepResult>) -> Self {
        Self {
            success: false,
            message: format!("Failed at {} stage", stage),
            steps,
        }
    }
}
