use std::{sync::Arc, time::Duration};

use iris_client::{
    models::{JobPhase, JobStatus},
    traits::TrackJobs,
    Backend,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;

const POLL_INTERVAL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone)]
pub enum TrackerEvent {
    /// A fresh snapshot, one per successful poll, the terminal one included.
    Status(JobStatus),
    /// One poll failed; the schedule keeps running.
    PollFailed(String),
    /// The job reached a terminal state and polling has stopped.
    Done(TrackerOutcome),
}

#[derive(Debug, Clone)]
pub enum TrackerOutcome {
    Completed(JobStatus),
    Failed(JobStatus),
}

/// Follows one job at a time until it completes or fails. A single poll is
/// in flight at any moment; the next delay is not armed until the previous
/// result has been seen. Starting a new job cancels the old schedule; a poll
/// already in flight at that point finishes and its result is dropped.
pub struct JobTracker {
    backend: Arc<dyn Backend>,
    poll_interval: Duration,
    cancellation_token: CancellationToken,
}

impl JobTracker {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            poll_interval: POLL_INTERVAL,
            cancellation_token: CancellationToken::new(),
        }
    }

    #[cfg(test)]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn start(&mut self, job_id: impl Into<String>) -> UnboundedReceiver<TrackerEvent> {
        self.cancel();
        self.cancellation_token = CancellationToken::new();

        let token = self.cancellation_token.clone();
        let backend = self.backend.clone();
        let job_id = job_id.into();
        let interval = self.poll_interval;
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                let result = backend.job_status(&job_id).await;

                // a restart can supersede this poll while it is in flight,
                // in which case the result is dropped
                if token.is_cancelled() {
                    break;
                }

                match result {
                    Ok(status) => {
                        let phase = status.phase();
                        if tx.send(TrackerEvent::Status(status.clone())).is_err() {
                            break;
                        }

                        match phase {
                            JobPhase::Completed => {
                                let _ = tx.send(TrackerEvent::Done(TrackerOutcome::Completed(
                                    status,
                                )));
                                break;
                            }
                            JobPhase::Failed => {
                                let _ =
                                    tx.send(TrackerEvent::Done(TrackerOutcome::Failed(status)));
                                break;
                            }
                            JobPhase::Pending => {}
                        }
                    }
                    Err(err) => {
                        tracing::warn!("polling {} failed: {}", job_id, err);
                        if tx.send(TrackerEvent::PollFailed(err.to_string())).is_err() {
                            break;
                        }
                    }
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = token.cancelled() => break,
                }
            }
        });

        rx
    }

    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }
}

impl Drop for JobTracker {
    fn drop(&mut self) {
        self.cancel();
    }
}
