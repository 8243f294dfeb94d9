use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body for both review submissions. Exactly one of `pr_number` and
/// `branch_name` is set, depending on which constructor built it; the unset
/// one is left off the wire entirely.
#[derive(Clone, Serialize)]
pub struct ReviewRequest {
    pub repo_owner: String,
    pub repo_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    pub git_pat: String,
    pub user_email: String,
    pub code_repo_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<serde_json::Map<String, Value>>,
}

impl ReviewRequest {
    pub fn pull_request(
        repo_owner: impl Into<String>,
        repo_name: impl Into<String>,
        pr_number: u64,
        git_pat: impl Into<String>,
        user_email: impl Into<String>,
    ) -> Self {
        Self {
            repo_owner: repo_owner.into(),
            repo_name: repo_name.into(),
            pr_number: Some(pr_number),
            branch_name: None,
            git_pat: git_pat.into(),
            user_email: user_email.into(),
            code_repo_type: "GenAI".into(),
            additional_context: None,
        }
    }

    pub fn branch(
        repo_owner: impl Into<String>,
        repo_name: impl Into<String>,
        branch_name: impl Into<String>,
        git_pat: impl Into<String>,
        user_email: impl Into<String>,
    ) -> Self {
        Self {
            repo_owner: repo_owner.into(),
            repo_name: repo_name.into(),
            pr_number: None,
            branch_name: Some(branch_name.into()),
            git_pat: git_pat.into(),
            user_email: user_email.into(),
            code_repo_type: "GenAI".into(),
            additional_context: None,
        }
    }

    pub fn with_repo_type(mut self, code_repo_type: impl Into<String>) -> Self {
        self.code_repo_type = code_repo_type.into();
        self
    }

    pub fn with_context(mut self, context: serde_json::Map<String, Value>) -> Self {
        self.additional_context = Some(context);
        self
    }
}

// The pat is a credential, keep it out of debug output and logs.
impl std::fmt::Debug for ReviewRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewRequest")
            .field("repo_owner", &self.repo_owner)
            .field("repo_name", &self.repo_name)
            .field("pr_number", &self.pr_number)
            .field("branch_name", &self.branch_name)
            .field("git_pat", &"<redacted>")
            .field("user_email", &self.user_email)
            .field("code_repo_type", &self.code_repo_type)
            .field("additional_context", &self.additional_context)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmittedJob {
    pub job_id: String,
}

/// Snapshot of a job as the backend reports it. `status` is the backend's
/// free-form label; use [`JobStatus::phase`] to decide whether to keep
/// polling.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobStatus {
    pub job_id: String,
    pub status: String,
    pub progress: Option<u8>,
    pub message: Option<String>,
    pub result: Option<Value>,
}

impl JobStatus {
    pub fn phase(&self) -> JobPhase {
        match self.status.to_ascii_lowercase().as_str() {
            "completed" => JobPhase::Completed,
            "failed" => JobPhase::Failed,
            _ => JobPhase::Pending,
        }
    }
}

/// Closed view of the backend's status vocabulary. Only the two terminal
/// labels are matched; anything else, including labels added later, counts
/// as pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Pending,
    Completed,
    Failed,
}

impl JobPhase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobPhase::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReviewReport {
    pub report_id: String,
    pub job_id: String,
    pub metadata: ReportMetadata,
    pub overall_scores: HashMap<String, f64>,
    pub issues: Vec<Value>,
    pub file_reviews: Vec<Value>,
    pub overall_assessment: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportMetadata {
    pub repository: String,
    pub pr_number: Option<u64>,
    pub branch_name: Option<String>,
    pub review_type: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pr_request_leaves_branch_off_the_wire() -> anyhow::Result<()> {
        let request = ReviewRequest::pull_request("acme", "widgets", 42, "pat", "dev@acme.io");
        let body = serde_json::to_value(&request)?;

        assert_eq!(Some(42), body["pr_number"].as_u64());
        assert!(body.get("branch_name").is_none());
        assert!(body.get("additional_context").is_none());
        assert_eq!(Some("GenAI"), body["code_repo_type"].as_str());

        Ok(())
    }

    #[test]
    fn branch_request_leaves_pr_number_off_the_wire() -> anyhow::Result<()> {
        let request = ReviewRequest::branch("acme", "widgets", "main", "pat", "dev@acme.io")
            .with_repo_type("Backend");
        let body = serde_json::to_value(&request)?;

        assert_eq!(Some("main"), body["branch_name"].as_str());
        assert!(body.get("pr_number").is_none());
        assert_eq!(Some("Backend"), body["code_repo_type"].as_str());

        Ok(())
    }

    #[test]
    fn debug_output_redacts_the_pat() {
        let request =
            ReviewRequest::pull_request("acme", "widgets", 42, "ghp_secret", "dev@acme.io");
        let printed = format!("{:?}", request);

        assert!(!printed.contains("ghp_secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn terminal_phases_only_match_the_two_known_labels() {
        let status = |label: &str| JobStatus {
            job_id: "job-1".into(),
            status: label.into(),
            progress: None,
            message: None,
            result: None,
        };

        assert_eq!(JobPhase::Completed, status("completed").phase());
        assert_eq!(JobPhase::Failed, status("FAILED").phase());
        assert_eq!(JobPhase::Pending, status("processing").phase());
        assert_eq!(JobPhase::Pending, status("queued").phase());
        assert_eq!(JobPhase::Pending, status("some-new-label").phase());
        assert!(status("completed").phase().is_terminal());
        assert!(!status("processing").phase().is_terminal());
    }
}
