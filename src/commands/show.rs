//! `show`: render a saved analysis result without contacting the backend.

use super::emit_view;
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::models::MetricKind;
use crate::store::AnalysisStore;
use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct ShowOptions {
    pub path: PathBuf,
    pub json: bool,
    /// Trend chart metric; the configured default when unset.
    pub metric: Option<MetricKind>,
    pub expand: Vec<MetricKind>,
    pub collapse: Vec<MetricKind>,
}

pub fn run_show(options: &ShowOptions, config: &Config) -> Result<()> {
    info!(path = %options.path.display(), "Rendering saved analysis");

    let mut store = AnalysisStore::new();
    store.load_file(&options.path)?;

    let mut dashboard = Dashboard::from_config(config)?;
    if let Some(metric) = options.metric {
        dashboard.select_trend_metric(metric);
    }
    for kind in &options.expand {
        dashboard.toggles_mut().set(*kind, true);
    }
    for kind in &options.collapse {
        dashboard.toggles_mut().set(*kind, false);
    }

    let view = dashboard.build_view(&store, None);
    emit_view(&view, options.json, config)
}
