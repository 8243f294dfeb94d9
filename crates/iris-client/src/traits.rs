use async_trait::async_trait;

use crate::{
    error::ApiError,
    models::{JobStatus, ReviewReport, ReviewRequest, SubmittedJob},
};

/// The two write operations. Submitting is not idempotent; every call
/// enqueues a fresh job.
#[async_trait]
pub trait SubmitReviews {
    async fn submit_pr_review(&self, request: &ReviewRequest) -> Result<SubmittedJob, ApiError>;
    async fn submit_repo_review(&self, request: &ReviewRequest) -> Result<SubmittedJob, ApiError>;
}

/// The read operations, keyed by the ids earlier calls handed out. All of
/// these fetch fresh state and are safe to repeat.
#[async_trait]
pub trait TrackJobs {
    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ApiError>;
    async fn job_reports(&self, job_id: &str) -> Result<Vec<ReviewReport>, ApiError>;
    async fn report_content(&self, report_id: &str) -> Result<ReviewReport, ApiError>;
}
