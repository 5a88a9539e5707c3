//! Export job status polling.
//!
//! [`StatusPoller::start`] spawns one task per job. The task fetches the
//! status immediately and then every `interval`, publishes each observation
//! on a `watch` channel, and ends itself once the job is `ready` or `failed`.
//! A fetch error is reported as `failed`. The returned [`PollHandle`] cancels
//! the task on [`PollHandle::cancel`] or when dropped, so a torn-down view
//! never leaves a timer behind.

use crate::client::AnalysisClient;
use crate::models::{JobState, JobStatusResponse};
use anyhow::Result;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Anything that can report the status of an export job.
pub trait StatusSource: Send + Sync + 'static {
    fn poll_status<'a>(&'a self, job_id: &'a str) -> BoxFuture<'a, Result<JobStatusResponse>>;
}

impl StatusSource for AnalysisClient {
    fn poll_status<'a>(&'a self, job_id: &'a str) -> BoxFuture<'a, Result<JobStatusResponse>> {
        Box::pin(async move { Ok(self.fetch_status(job_id).await?) })
    }
}

/// Latest observation of a job. `status` is `None` until the backend reports
/// a recognised state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollState {
    pub status: Option<JobState>,
    pub download_url: Option<String>,
}

impl PollState {
    fn from_response(response: JobStatusResponse) -> Self {
        Self {
            status: JobState::parse(&response.status),
            download_url: response.download_url,
        }
    }

    fn failed() -> Self {
        Self {
            status: Some(JobState::Failed),
            download_url: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.map(|s| s.is_terminal()).unwrap_or(false)
    }

    /// Download link once the export is ready.
    pub fn ready_url(&self) -> Option<&str> {
        match self.status {
            Some(JobState::Ready) => self.download_url.as_deref(),
            _ => None,
        }
    }
}

pub struct StatusPoller<S: StatusSource> {
    source: Arc<S>,
    interval: Duration,
}

impl<S: StatusSource> StatusPoller<S> {
    pub fn new(source: Arc<S>, interval: Duration) -> Self {
        Self { source, interval }
    }

    /// Start polling `job_id`. Must be called from within a tokio runtime.
    pub fn start(&self, job_id: impl Into<String>) -> PollHandle {
        let job_id = job_id.into();
        let source = Arc::clone(&self.source);
        let interval = self.interval;
        let (tx, rx) = watch::channel(PollState::default());

        info!(job_id = %job_id, interval_ms = interval.as_millis() as u64, "Starting status polling");

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let state = match source.poll_status(&job_id).await {
                    Ok(response) => PollState::from_response(response),
                    Err(e) => {
                        warn!(job_id = %job_id, error = %e, "Status fetch failed, marking job failed");
                        PollState::failed()
                    }
                };

                debug!(job_id = %job_id, status = ?state.status, "Polled job status");

                let terminal = state.is_terminal();
                tx.send_replace(state);
                if terminal {
                    info!(job_id = %job_id, "Job reached a terminal state, polling stopped");
                    break;
                }
            }
        });

        PollHandle { rx, task }
    }
}

/// Cancellation handle for one polling task.
pub struct PollHandle {
    rx: watch::Receiver<PollState>,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn state(&self) -> PollState {
        self.rx.borrow().clone()
    }

    /// Wait for the next published state. Returns `None` once polling has
    /// ended and no further states will arrive.
    pub async fn next_state(&mut self) -> Option<PollState> {
        match self.rx.changed().await {
            Ok(()) => Some(self.rx.borrow_and_update().clone()),
            Err(_) => None,
        }
    }

    /// Wait until the job is terminal, or polling stops for another reason,
    /// and return the last observed state.
    pub async fn wait_terminal(&mut self) -> PollState {
        loop {
            let current = self.rx.borrow_and_update().clone();
            if current.is_terminal() {
                return current;
            }
            if self.rx.changed().await.is_err() {
                return self.rx.borrow().clone();
            }
        }
    }

    pub fn cancel(&self) {
        if !self.task.is_finished() {
            debug!("Cancelling status polling");
        }
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
