use anyhow::{bail, Result};
use cohort_dashboard::models::{JobState, JobStatusResponse};
use cohort_dashboard::poller::{StatusPoller, StatusSource};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const INTERVAL: Duration = Duration::from_secs(3);

/// Replays a scripted list of statuses; the last entry repeats forever.
/// `None` entries simulate a failed request.
struct ScriptedSource {
    script: Mutex<Vec<Option<&'static str>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn new(script: Vec<Option<&'static str>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StatusSource for ScriptedSource {
    fn poll_status<'a>(&'a self, _job_id: &'a str) -> BoxFuture<'a, Result<JobStatusResponse>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = {
                let mut script = self.script.lock().unwrap();
                if script.len() > 1 {
                    script.remove(0)
                } else {
                    script[0]
                }
            };
            match next {
                Some(status) => Ok(JobStatusResponse {
                    status: status.to_string(),
                    download_url: (status == "ready").then(|| "http://files/export.zip".to_string()),
                }),
                None => bail!("connection refused"),
            }
        })
    }
}

#[tokio::test(start_paused = true)]
async fn test_stops_when_ready() {
    let source = ScriptedSource::new(vec![Some("processing"), Some("processing"), Some("ready")]);
    let poller = StatusPoller::new(Arc::clone(&source), INTERVAL);
    let mut handle = poller.start("job-1");

    let state = handle.wait_terminal().await;
    assert_eq!(state.status, Some(JobState::Ready));
    assert_eq!(state.ready_url(), Some("http://files/export.zip"));
    assert_eq!(source.calls(), 3);

    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(source.calls(), 3);
    assert!(handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_fetch_error_marks_failed() {
    let source = ScriptedSource::new(vec![Some("processing"), None]);
    let poller = StatusPoller::new(Arc::clone(&source), INTERVAL);
    let mut handle = poller.start("job-2");

    let state = handle.wait_terminal().await;
    assert_eq!(state.status, Some(JobState::Failed));
    assert_eq!(state.ready_url(), None);

    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(source.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_first_fetch_is_immediate() {
    let source = ScriptedSource::new(vec![Some("processing")]);
    let poller = StatusPoller::new(Arc::clone(&source), INTERVAL);
    let mut handle = poller.start("job-3");

    let state = handle.next_state().await.unwrap();
    assert_eq!(state.status, Some(JobState::Processing));
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_status_keeps_polling() {
    let source = ScriptedSource::new(vec![Some("queued"), Some("queued"), Some("failed")]);
    let poller = StatusPoller::new(Arc::clone(&source), INTERVAL);
    let mut handle = poller.start("job-4");

    let first = handle.next_state().await.unwrap();
    assert_eq!(first.status, None);
    assert!(!first.is_terminal());

    let state = handle.wait_terminal().await;
    assert_eq!(state.status, Some(JobState::Failed));
    assert_eq!(source.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_polling() {
    let source = ScriptedSource::new(vec![Some("processing")]);
    let poller = StatusPoller::new(Arc::clone(&source), INTERVAL);
    let mut handle = poller.start("job-5");

    handle.next_state().await.unwrap();
    handle.cancel();
    let seen = source.calls();

    tokio::time::sleep(INTERVAL * 10).await;
    assert_eq!(source.calls(), seen);
    assert!(handle.next_state().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_drop_cancels_polling() {
    let source = ScriptedSource::new(vec![Some("processing")]);
    let poller = StatusPoller::new(Arc::clone(&source), INTERVAL);
    {
        let mut handle = poller.start("job-6");
        handle.next_state().await.unwrap();
    }
    let seen = source.calls();

    tokio::time::sleep(INTERVAL * 10).await;
    assert_eq!(source.calls(), seen);
}
