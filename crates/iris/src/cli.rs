use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use iris_client::{
    models::{ReportMetadata, ReviewRequest},
    rest::RestOptions,
    traits::{SubmitReviews, TrackJobs},
    ReviewClient,
};

use crate::{
    application_config::{inner_application_config, ApplicationConfig},
    job_tracker::{JobTracker, TrackerEvent, TrackerOutcome},
};

#[derive(Parser)]
#[command(name = "iris", version, about = "Submit and follow iris code review jobs")]
pub struct Command {
    #[command(subcommand)]
    pub(crate) command: Commands,

    #[command(flatten)]
    pub(crate) config: inner_application_config::InnerApplicationConfig,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Submit a review job
    Review {
        #[command(subcommand)]
        target: ReviewTarget,
    },
    /// Fetch the current status of a job once
    Status { job_id: String },
    /// Follow a job until it completes or fails
    Watch { job_id: String },
    /// List the reports a job produced
    Reports { job_id: String },
    /// Print one report in full
    Report { report_id: String },
}

#[derive(Subcommand)]
pub(crate) enum ReviewTarget {
    /// Review a single pull request
    Pr {
        /// Pull request number
        #[arg(long)]
        number: u64,

        #[command(flatten)]
        args: SubmitArgs,
    },
    /// Review a repository branch
    Repo {
        /// Branch to review
        #[arg(long, default_value = "main")]
        branch: String,

        #[command(flatten)]
        args: SubmitArgs,
    },
}

#[derive(Args)]
pub(crate) struct SubmitArgs {
    /// Repository owner, a user or an org
    #[arg(long)]
    owner: String,

    /// Repository name
    #[arg(long)]
    repo: String,

    /// Email to attach to the review
    #[arg(long, env = "IRIS_USER_EMAIL")]
    email: Option<String>,

    /// Kind of codebase under review
    #[arg(long, default_value = "GenAI")]
    repo_type: String,

    /// Git access token, sent along with this request and nowhere else
    #[arg(long, env = "IRIS_GIT_PAT", hide_env_values = true)]
    git_pat: String,

    /// Extra key=value pairs handed to the analyzer
    #[arg(long = "context", value_name = "KEY=VALUE")]
    context: Vec<String>,

    /// Follow the job after submitting
    #[arg(long)]
    watch: bool,
}

impl SubmitArgs {
    fn pr_request(&self, config: &ApplicationConfig, number: u64) -> anyhow::Result<ReviewRequest> {
        let request = ReviewRequest::pull_request(
            &self.owner,
            &self.repo,
            number,
            &self.git_pat,
            self.user_email(config)?,
        );

        self.finish(request)
    }

    fn repo_request(
        &self,
        config: &ApplicationConfig,
        branch: &str,
    ) -> anyhow::Result<ReviewRequest> {
        let request = ReviewRequest::branch(
            &self.owner,
            &self.repo,
            branch,
            &self.git_pat,
            self.user_email(config)?,
        );

        self.finish(request)
    }

    fn finish(&self, request: ReviewRequest) -> anyhow::Result<ReviewRequest> {
        let request = request.with_repo_type(&self.repo_type);

        Ok(match self.additional_context()? {
            Some(context) => request.with_context(context),
            None => request,
        })
    }

    fn user_email(&self, config: &ApplicationConfig) -> anyhow::Result<String> {
        self.email
            .clone()
            .or_else(|| config.user_email.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("no email given, pass --email or set user_email in the config file")
            })
    }

    fn additional_context(
        &self,
    ) -> anyhow::Result<Option<serde_json::Map<String, serde_json::Value>>> {
        if self.context.is_empty() {
            return Ok(None);
        }

        let mut map = serde_json::Map::new();
        for pair in &self.context {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                anyhow::anyhow!("context entries take the form key=value, got: {}", pair)
            })?;
            map.insert(
                key.to_string(),
                serde_json::Value::String(value.to_string()),
            );
        }

        Ok(Some(map))
    }
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Command::parse();
    let config = ApplicationConfig::new(cli.config).context("failed to load configuration")?;

    tracing::debug!("using backend at {}", config.backend_url);

    let client = ReviewClient::rest(RestOptions {
        base_url: config.backend_url.clone(),
    })?;

    match cli.command {
        Commands::Review { target } => submit(&client, &config, target).await,
        Commands::Status { job_id } => show_status(&client, &job_id).await,
        Commands::Watch { job_id } => watch(&client, &job_id).await,
        Commands::Reports { job_id } => list_reports(&client, &job_id).await,
        Commands::Report { report_id } => show_report(&client, &report_id).await,
    }
}

async fn submit(
    client: &ReviewClient,
    config: &ApplicationConfig,
    target: ReviewTarget,
) -> anyhow::Result<()> {
    let (submitted, watch_after) = match target {
        ReviewTarget::Pr { number, args } => {
            let request = args.pr_request(config, number)?;
            (client.submit_pr_review(&request).await?, args.watch)
        }
        ReviewTarget::Repo { branch, args } => {
            let request = args.repo_request(config, &branch)?;
            (client.submit_repo_review(&request).await?, args.watch)
        }
    };

    println!("submitted review job {}", submitted.job_id);

    if watch_after {
        return watch(client, &submitted.job_id).await;
    }

    println!("follow it with: iris watch {}", submitted.job_id);

    Ok(())
}

async fn show_status(client: &ReviewClient, job_id: &str) -> anyhow::Result<()> {
    let status = client.job_status(job_id).await?;

    println!("job {}: {}", status.job_id, status.status);
    if let Some(progress) = status.progress {
        println!("progress: {}%", progress);
    }
    if let Some(message) = &status.message {
        println!("message: {}", message);
    }
    if let Some(result) = &status.result {
        println!("result:\n{}", serde_json::to_string_pretty(result)?);
    }

    Ok(())
}

async fn watch(client: &ReviewClient, job_id: &str) -> anyhow::Result<()> {
    let mut tracker = JobTracker::new(Arc::clone(client));
    let mut events = tracker.start(job_id);

    while let Some(event) = events.recv().await {
        match event {
            TrackerEvent::Status(status) => {
                let progress = status
                    .progress
                    .map(|p| format!("{:>3}%", p))
                    .unwrap_or_else(|| "   -".into());
                match &status.message {
                    Some(message) => println!("{} {} {}", progress, status.status, message),
                    None => println!("{} {}", progress, status.status),
                }
            }
            TrackerEvent::PollFailed(err) => {
                eprintln!("poll failed: {}", err);
            }
            TrackerEvent::Done(TrackerOutcome::Completed(status)) => {
                println!("job {} completed", status.job_id);
                println!("list reports with: iris reports {}", status.job_id);
                return Ok(());
            }
            TrackerEvent::Done(TrackerOutcome::Failed(status)) => {
                let reason = status
                    .message
                    .unwrap_or_else(|| "no failure message".into());
                anyhow::bail!("job {} failed: {}", status.job_id, reason);
            }
        }
    }

    Ok(())
}

async fn list_reports(client: &ReviewClient, job_id: &str) -> anyhow::Result<()> {
    let reports = client.job_reports(job_id).await?;

    if reports.is_empty() {
        println!("no reports yet for job {}", job_id);
        return Ok(());
    }

    let formatter = timeago::Formatter::new();
    for report in &reports {
        let age = Utc::now()
            .signed_duration_since(report.metadata.generated_at)
            .to_std()
            .map(|d| formatter.convert(d))
            .unwrap_or_else(|_| "just now".into());

        println!(
            "{} {} {} {} ({})",
            report.report_id,
            report.metadata.review_type,
            report.metadata.repository,
            target_label(&report.metadata),
            age,
        );
        if !report.overall_scores.is_empty() {
            let mut scores: Vec<_> = report.overall_scores.iter().collect();
            scores.sort_by(|a, b| a.0.cmp(b.0));
            let scores = scores
                .iter()
                .map(|(name, score)| format!("{} {:.1}", name, score))
                .collect::<Vec<_>>()
                .join(", ");
            println!("  {}", scores);
        }
    }

    Ok(())
}

async fn show_report(client: &ReviewClient, report_id: &str) -> anyhow::Result<()> {
    let report = client.report_content(report_id).await?;

    println!("report {} for job {}", report.report_id, report.job_id);
    println!(
        "{} {} {}",
        report.metadata.review_type,
        report.metadata.repository,
        target_label(&report.metadata)
    );
    println!("generated at {}", report.metadata.generated_at);

    if !report.overall_scores.is_empty() {
        println!();
        println!("scores:");
        let mut scores: Vec<_> = report.overall_scores.iter().collect();
        scores.sort_by(|a, b| a.0.cmp(b.0));
        for (name, score) in scores {
            println!("  {}: {:.1}", name, score);
        }
    }

    if !report.issues.is_empty() {
        println!();
        println!("issues ({}):", report.issues.len());
        println!("{}", serde_json::to_string_pretty(&report.issues)?);
    }

    if !report.file_reviews.is_empty() {
        println!();
        println!("file reviews ({}):", report.file_reviews.len());
        println!("{}", serde_json::to_string_pretty(&report.file_reviews)?);
    }

    println!();
    println!("{}", report.overall_assessment);

    Ok(())
}

fn target_label(metadata: &ReportMetadata) -> String {
    match (metadata.pr_number, &metadata.branch_name) {
        (Some(number), _) => format!("#{}", number),
        (None, Some(branch)) => branch.clone(),
        (None, None) => "-".into(),
    }
}
