//! `status`: check an export job once, or follow it until it finishes.

use crate::client::AnalysisClient;
use crate::config::Config;
use crate::models::JobState;
use crate::poller::{PollState, StatusPoller};
use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;

pub async fn run_status(job_id: &str, watch: bool, config: &Config) -> Result<()> {
    let client = Arc::new(AnalysisClient::from_config(&config.api)?);

    if !watch {
        let response = client.fetch_status(job_id).await?;
        print_state(&PollState {
            status: JobState::parse(&response.status),
            download_url: response.download_url,
        });
        return Ok(());
    }

    let poller = StatusPoller::new(Arc::clone(&client), config.api.poll_interval());
    let mut handle = poller.start(job_id);
    while let Some(state) = handle.next_state().await {
        print_state(&state);
        if state.is_terminal() {
            break;
        }
    }
    Ok(())
}

fn print_state(state: &PollState) {
    match state.status {
        Some(JobState::Ready) => {
            println!("{} {}", "✅".bright_green(), "ready".bright_green().bold());
            if let Some(url) = state.ready_url() {
                println!("   Download: {}", url.bright_cyan().underline());
            }
        }
        Some(JobState::Failed) => println!("{} {}", "❌".bright_red(), "failed".bright_red().bold()),
        Some(JobState::Processing) => println!("{} {}", "⏳".bright_blue(), "processing".bright_white()),
        None => println!("{} {}", "…".dimmed(), "no status yet".dimmed()),
    }
}
