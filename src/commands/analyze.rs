//! `analyze`: submit an analysis and render the resulting dashboard.
//!
//! The request is validated locally first; nothing is sent if it would be
//! rejected. With `wait`, the export job is polled until it is ready or
//! failed and the download link is included in the output.

use super::emit_view;
use crate::client::AnalysisClient;
use crate::config::Config;
use crate::dashboard::{Dashboard, Notification};
use crate::models::JobState;
use crate::poller::StatusPoller;
use crate::request::AnalysisRequest;
use crate::store::AnalysisStore;
use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub request: AnalysisRequest,
    pub json: bool,
    pub wait: bool,
}

pub async fn run_analyze(options: AnalyzeOptions, config: &Config) -> Result<()> {
    options.request.validate()?;

    let client = Arc::new(AnalysisClient::from_config(&config.api)?);
    let dashboard = Dashboard::from_config(config)?;

    if !options.json {
        println!("{} Running cohort analysis...", "🚀".bright_yellow());
    }

    let response = client.run_analysis(&options.request).await?;
    let mut store = AnalysisStore::new();
    store.set(response);

    let poll = match (options.wait, store.job_id()) {
        (true, Some(job_id)) => {
            if !options.json {
                println!("{} Waiting for export {}...", "⏳".bright_blue(), job_id);
            }
            let poller = StatusPoller::new(Arc::clone(&client), config.api.poll_interval());
            let mut handle = poller.start(job_id);
            Some(handle.wait_terminal().await)
        }
        _ => None,
    };

    let mut view = dashboard.build_view(&store, poll.as_ref());
    view.notifications.push(Notification::info(
        "Analysis Complete",
        "Cohort analysis has been generated successfully",
    ));
    if poll.as_ref().and_then(|p| p.status) == Some(JobState::Failed) {
        view.notifications
            .push(Notification::error("Export job failed; no download is available"));
    }

    info!(job_id = store.job_id().unwrap_or("-"), "Analysis rendered");
    emit_view(&view, options.json, config)
}
