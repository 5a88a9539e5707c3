//! Cohort Dashboard Library
//!
//! Terminal presentation layer for a cohort-analytics backend. The backend
//! does the heavy lifting (grouping users into cohorts and computing the
//! retention, revenue, ARPU and LTV tables); this crate turns its results into
//! a dashboard a person can read.
//!
//! ## Architecture Overview
//!
//! - [`models`] - Typed view of the backend's JSON contract
//! - [`cohort_key`] - Parsing and ordering of cohort and period keys
//! - [`matrix`] - Sparse table to dense, capped matrix normalization
//! - [`format`] - Percent and currency rendering of cell values
//! - [`trends`] - Per-period series for the multi-cohort trend chart
//! - [`store`] - Ownership of the latest completed analysis
//! - [`dashboard`] - View model, section toggles and text/JSON rendering
//! - [`request`] - Analysis request payload and local validation
//! - [`client`] - HTTP client for upload, schema, analysis and job status
//! - [`poller`] - Cancellable export job status polling
//! - [`config`] - Configuration with file and environment overrides
//! - [`logging`] - Structured logging setup
//! - [`commands`] - CLI subcommand implementations
//!
//! ## Example
//!
//! ```rust,no_run
//! use cohort_dashboard::{AnalysisStore, Dashboard};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let mut store = AnalysisStore::new();
//! store.load_file(Path::new("result.json"))?;
//!
//! let view = Dashboard::default().build_view(&store, None);
//! print!("{}", cohort_dashboard::dashboard::render_text(&view));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod cohort_key;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod format;
pub mod logging;
pub mod matrix;
pub mod models;
pub mod poller;
pub mod request;
pub mod store;
pub mod trends;

pub use dashboard::{Dashboard, DashboardView, SectionToggles};
pub use format::{format_value, ValueFormatter};
pub use matrix::{normalize, CohortMatrix, CohortRow};
pub use models::{AnalysisResponse, AnalysisResult, CohortTable, MetricKind};
pub use store::AnalysisStore;
pub use trends::{build_series, TrendChart, TrendSeriesPoint};
