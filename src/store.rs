//! Analysis state ownership.
//!
//! One [`AnalysisStore`] holds the latest completed analysis. It has a single
//! writer (the submission flow calls [`AnalysisStore::set`] once per completed
//! analysis) and any number of readers borrowing it immutably.

use crate::models::{AnalysisResponse, AnalysisResult};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct AnalysisStore {
    response: Option<AnalysisResponse>,
}

impl AnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored analysis wholesale.
    pub fn set(&mut self, response: AnalysisResponse) {
        info!(
            job_id = response.job_id.as_deref().unwrap_or("-"),
            "Storing analysis result"
        );
        self.response = Some(response);
    }

    pub fn clear(&mut self) {
        debug!("Clearing analysis result");
        self.response = None;
    }

    /// Read a saved response (envelope or bare result) from disk and store it.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read analysis result: {}", path.display()))?;
        let response = AnalysisResponse::from_json(&content)
            .with_context(|| format!("Invalid analysis result: {}", path.display()))?;
        self.set(response);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.response.is_some()
    }

    pub fn response(&self) -> Option<&AnalysisResponse> {
        self.response.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.response.as_ref().map(|r| &r.data)
    }

    pub fn chart_data(&self) -> Option<&BTreeMap<String, String>> {
        self.response.as_ref().and_then(|r| r.chart_data.as_ref())
    }

    /// Observations generated for the analysis, falling back to the
    /// result's own insight list.
    pub fn observations(&self) -> Option<&[String]> {
        let response = self.response.as_ref()?;
        response
            .llm_observations
            .as_deref()
            .or(response.data.insights.as_deref())
    }

    pub fn job_id(&self) -> Option<&str> {
        self.response.as_ref().and_then(|r| r.job_id.as_deref())
    }
}
