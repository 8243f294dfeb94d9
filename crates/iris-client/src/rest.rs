use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    error::ApiError,
    models::{JobStatus, ReviewReport, ReviewRequest, SubmittedJob},
    traits::{SubmitReviews, TrackJobs},
    Backend,
};

/// Talks to the review backend over its json api.
pub struct RestBackend {
    client: Client,
    base_url: String,
}

pub struct RestOptions {
    pub base_url: String,
}

impl Default for RestOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

impl RestBackend {
    pub fn new(options: RestOptions) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("iris/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let res = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;

        Self::read_body(res).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let res = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        Self::read_body(res).await
    }

    async fn read_body<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, ApiError> {
        let status = res.status();
        if !status.is_success() {
            // Best effort: the backend sends {"detail": ...} on errors, but
            // proxies and crashes produce arbitrary bodies.
            let message = match res.json::<ErrorBody>().await {
                Ok(body) => body.detail,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
            };
            tracing::error!("review backend returned {}: {}", status, message);
            return Err(ApiError::Http { status, message });
        }

        let body = res.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SubmitReviews for RestBackend {
    async fn submit_pr_review(&self, request: &ReviewRequest) -> Result<SubmittedJob, ApiError> {
        tracing::debug!(
            "submitting pr review for {}/{}",
            request.repo_owner,
            request.repo_name
        );

        self.post("/api/v2/review/pr", request).await
    }

    async fn submit_repo_review(&self, request: &ReviewRequest) -> Result<SubmittedJob, ApiError> {
        tracing::debug!(
            "submitting repo review for {}/{}",
            request.repo_owner,
            request.repo_name
        );

        self.post("/api/v2/review/repo", request).await
    }
}

#[async_trait]
impl TrackJobs for RestBackend {
    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ApiError> {
        self.get(&format!("/api/v2/status/{}", job_id)).await
    }

    async fn job_reports(&self, job_id: &str) -> Result<Vec<ReviewReport>, ApiError> {
        self.get(&format!("/api/v2/reports/{}", job_id)).await
    }

    async fn report_content(&self, report_id: &str) -> Result<ReviewReport, ApiError> {
        self.get(&format!("/api/v2/reports/{}/content", report_id))
            .await
    }
}

impl Backend for RestBackend {}
