//! `upload`: send a dataset to the backend.

use super::emit_json;
use crate::client::AnalysisClient;
use crate::config::Config;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub async fn run_upload(path: &Path, json: bool, config: &Config) -> Result<()> {
    let client = AnalysisClient::from_config(&config.api)?;
    let response = client.upload_file(path).await?;

    if json {
        return emit_json(&response, config);
    }

    println!(
        "{} {}",
        "✅".bright_green(),
        if response.message.is_empty() {
            "File uploaded successfully"
        } else {
            response.message.as_str()
        }
    );
    println!("   Stored as: {}", response.filename.bright_white().bold());
    println!(
        "{} Pass {} to analyze",
        "💡".bright_yellow(),
        format!("--filename {}", response.filename).bright_cyan()
    );
    Ok(())
}
