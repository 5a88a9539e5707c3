//! Cohort Dashboard
//!
//! Builds a rendering-ready [`DashboardView`] from the current
//! [`AnalysisStore`] contents and the latest export job observation.
//!
//! ## Sections
//!
//! - **Summary**: analysis title, date range and the headline counters
//! - **Metric matrices**: one collapsible table per metric present in the
//!   result, capped to the configured number of cohorts and periods
//! - **Data preview**: the first rows of the uploaded dataset
//! - **Heatmap**: link to the backend-rendered retention heatmap
//! - **Trends**: one line per cohort for the selected metric, with an
//!   illustrative dataset when there is nothing to plot
//! - **Observations**: generated insights about the analysis
//!
//! ## Failure isolation
//!
//! Each section is built behind its own boundary. A section that fails is
//! left out of the view, logged, and reported as a [`Notification`]; the
//! remaining sections still render.

pub mod render;
pub mod state;
pub mod view;

pub use render::{render_json, render_text};
pub use state::SectionToggles;
pub use view::{
    DashboardView, HeatmapView, MatrixRowView, MatrixView, Notification, NotificationVariant,
    ObservationsView, PreviewView, SummaryCard, SummaryView,
};

use crate::cohort_key::CohortKeyParser;
use crate::config::{ApiConfig, Config};
use crate::format::{format_count, format_number, ValueFormatter};
use crate::matrix::{self, DEFAULT_MAX_COHORTS, DEFAULT_MAX_PERIODS};
use crate::models::{AnalysisResult, CohortInterval, CohortSizes, CohortTable, MetricKind};
use crate::poller::PollState;
use crate::store::AnalysisStore;
use crate::trends::TrendChart;
use anyhow::{bail, Context, Result};
use chrono::Local;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};

pub const HEATMAP_PLACEHOLDER: &str = "Run analysis to generate retention heatmap";
pub const HEATMAP_INFO: &str =
    "Retention rates shown as percentages. Darker colors indicate higher retention.";
pub const NO_INSIGHTS: &str = "No insights available for this analysis.";

pub struct Dashboard {
    toggles: SectionToggles,
    trend_metric: MetricKind,
    formatter: ValueFormatter,
    max_cohorts: usize,
    max_periods: usize,
    asset_base_url: String,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            toggles: SectionToggles::default(),
            trend_metric: MetricKind::Retention,
            formatter: ValueFormatter::default(),
            max_cohorts: DEFAULT_MAX_COHORTS,
            max_periods: DEFAULT_MAX_PERIODS,
            asset_base_url: ApiConfig::default().asset_base_url,
        }
    }
}

impl Dashboard {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            toggles: SectionToggles::default(),
            trend_metric: config.display.default_metric()?,
            formatter: ValueFormatter::new(config.display.currency_symbol.clone()),
            max_cohorts: config.display.max_cohorts,
            max_periods: config.display.max_periods,
            asset_base_url: config.api.asset_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn with_caps(mut self, max_cohorts: usize, max_periods: usize) -> Self {
        self.max_cohorts = max_cohorts;
        self.max_periods = max_periods;
        self
    }

    pub fn with_asset_base_url(mut self, url: impl Into<String>) -> Self {
        self.asset_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn toggles(&self) -> &SectionToggles {
        &self.toggles
    }

    pub fn toggles_mut(&mut self) -> &mut SectionToggles {
        &mut self.toggles
    }

    pub fn trend_metric(&self) -> MetricKind {
        self.trend_metric
    }

    /// Switch the trend chart to another metric.
    pub fn select_trend_metric(&mut self, metric: MetricKind) {
        debug!(metric = %metric, "Selected trend metric");
        self.trend_metric = metric;
    }

    pub fn build_view(&self, store: &AnalysisStore, poll: Option<&PollState>) -> DashboardView {
        let mut notifications = Vec::new();
        let result = store.result();

        let mut view = DashboardView {
            has_result: result.is_some(),
            ..DashboardView::default()
        };

        if let Some(result) = result {
            view.summary = guard_section("summary", &mut notifications, || self.summary(result));

            if let Some(sizes) = result.cohort_sizes() {
                for kind in MetricKind::ALL {
                    let Some(table) = result.table(kind) else {
                        continue;
                    };
                    let built = guard_section(kind.table_label(), &mut notifications, || {
                        self.matrix(result, kind, table, sizes)
                    });
                    if let Some(matrix) = built {
                        view.matrices.push(matrix);
                    }
                }
            }

            view.preview = guard_section("data preview", &mut notifications, || preview(result))
                .flatten();
        }

        view.heatmap = guard_section("heatmap", &mut notifications, || self.heatmap(result));

        view.trends = guard_section("trend chart", &mut notifications, || {
            Ok(match result {
                Some(result) => TrendChart::build(result, self.trend_metric),
                None => TrendChart::fallback(self.trend_metric),
            })
        });

        view.observations = guard_section("observations", &mut notifications, || {
            Ok(observations(store.observations().unwrap_or_default()))
        });

        view.download_url = poll.and_then(|p| p.ready_url()).map(str::to_string);
        view.notifications = notifications;
        view
    }

    fn summary(&self, result: &AnalysisResult) -> Result<SummaryView> {
        let title = match result.analysis_type.as_deref() {
            Some("revenue") => "Revenue Analysis",
            Some("retention") => "Retention Analysis",
            _ => "Analysis Results",
        };

        let date_range = result.date_range.as_ref().and_then(|range| {
            match (range.start.as_deref(), range.end.as_deref()) {
                (Some(start), Some(end)) => {
                    Some(format!("{} - {}", short_date(start), short_date(end)))
                }
                _ => None,
            }
        });

        let mut cards = Vec::new();
        if let Some(rows) = result.total_rows.filter(|n| *n > 0) {
            cards.push(SummaryCard {
                label: "Total Rows",
                value: format_count(rows),
            });
        }
        if let Some(users) = result.unique_users.filter(|n| *n > 0) {
            cards.push(SummaryCard {
                label: "Unique Users",
                value: format_count(users),
            });
        }
        if let Some(revenue) = result.total_revenue {
            cards.push(SummaryCard {
                label: "Total Revenue",
                value: self.formatter.currency(revenue),
            });
        }
        if let Some(interval) = result.cohort_interval.as_deref().filter(|s| !s.is_empty()) {
            cards.push(SummaryCard {
                label: "Cohort Interval",
                value: capitalize(interval),
            });
        }

        Ok(SummaryView {
            title: title.to_string(),
            date_range,
            cards,
            note: result.note.clone(),
        })
    }

    fn matrix(
        &self,
        result: &AnalysisResult,
        kind: MetricKind,
        table: &CohortTable,
        sizes: &CohortSizes,
    ) -> Result<MatrixView> {
        if self.max_cohorts == 0 || self.max_periods == 0 {
            bail!(
                "Display caps must be positive (cohorts: {}, periods: {})",
                self.max_cohorts,
                self.max_periods
            );
        }

        let monthly = result.interval() == CohortInterval::Monthly;
        let (cohort_header, period_word) = if monthly {
            ("Cohort (Signup Month)", "Month")
        } else {
            ("Cohort (Signup Period)", "Period")
        };

        let expanded = self.toggles.is_expanded(kind);
        let normalized = matrix::normalize(table, sizes, self.max_cohorts, self.max_periods);

        let period_headers = normalized
            .periods
            .iter()
            .map(|p| format!("{} {}", period_word, p))
            .collect();

        let rows = if expanded {
            normalized
                .rows
                .iter()
                .map(|row| MatrixRowView {
                    cohort: row.cohort_key.clone(),
                    label: CohortKeyParser::display_label(&row.cohort_key),
                    users: row.size,
                    cells: normalized
                        .periods
                        .iter()
                        .map(|&p| {
                            row.cell(p)
                                .map(|v| self.formatter.format(v, kind))
                                .unwrap_or_default()
                        })
                        .collect(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let notice = normalized.truncated.then(|| {
            format!(
                "Showing first {} cohorts and first {} periods. Scroll to see more or refine your cohort interval.",
                self.max_cohorts, self.max_periods
            )
        });

        Ok(MatrixView {
            kind,
            title: kind.section_title(),
            expanded,
            cohort_header: cohort_header.to_string(),
            period_headers,
            rows,
            notice,
        })
    }

    fn heatmap(&self, result: Option<&AnalysisResult>) -> Result<HeatmapView> {
        let image_url = match result.and_then(|r| r.heatmap_path()) {
            Some(path) => Some(self.asset_url(path)?),
            None => None,
        };

        Ok(HeatmapView {
            image_url,
            interval: result.and_then(|r| r.cohort_interval.clone()),
        })
    }

    /// Absolute URL for a backend asset path, percent-encoded.
    fn asset_url(&self, path: &str) -> Result<String> {
        let joined = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.asset_base_url, path.trim_start_matches('/'))
        };
        let url = Url::parse(&joined).with_context(|| format!("Invalid asset URL: {:?}", joined))?;
        Ok(url.to_string())
    }
}

/// Run one section builder. On failure the section is dropped and the user
/// gets a notification instead.
pub(crate) fn guard_section<T>(
    name: &str,
    notifications: &mut Vec<Notification>,
    build: impl FnOnce() -> Result<T>,
) -> Option<T> {
    match build() {
        Ok(section) => Some(section),
        Err(e) => {
            warn!(section = name, error = %e, "Dashboard section failed to render");
            notifications.push(Notification::error(format!(
                "Could not render {}: {}",
                name, e
            )));
            None
        }
    }
}

fn preview(result: &AnalysisResult) -> Result<Option<PreviewView>> {
    let (Some(rows), Some(columns)) = (result.head.as_ref(), result.columns.as_ref()) else {
        return Ok(None);
    };
    if rows.is_empty() || columns.is_empty() {
        return Ok(None);
    }

    let headers = columns.iter().map(|c| c.to_uppercase()).collect();
    let rows = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| preview_cell(column, row.get(column)))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(PreviewView { headers, rows }))
}

fn preview_cell(column: &str, value: Option<&Value>) -> Result<String> {
    Ok(match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) if s.is_empty() => "-".to_string(),
        Some(Value::String(s)) if column == "timestamp" => {
            match CohortKeyParser::parse_timestamp(s) {
                Ok(ts) => ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
                Err(_) => s.clone(),
            }
        }
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.is_f64() => n.as_f64().map(format_number).unwrap_or_default(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => serde_json::to_string(other)?,
    })
}

fn observations(items: &[String]) -> ObservationsView {
    let items = items
        .iter()
        .map(|item| {
            item.strip_prefix('*')
                .map(str::trim_start)
                .unwrap_or(item)
                .to_string()
        })
        .filter(|item| !item.is_empty())
        .collect();
    ObservationsView { items }
}

/// `2024-01-15` -> `1/15/2024`; unparseable input is shown as-is.
fn short_date(value: &str) -> String {
    CohortKeyParser::parse_date(value)
        .map(|d| d.format("%-m/%-d/%Y").to_string())
        .unwrap_or_else(|_| value.to_string())
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
