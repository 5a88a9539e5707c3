//! Core Data Models
//!
//! Typed view of the analysis backend's JSON contract. The backend returns an
//! envelope ([`AnalysisResponse`]) around the analysis aggregate
//! ([`AnalysisResult`]); every field is optional on the wire and stays optional
//! here so that a partially populated result still renders.
//!
//! ## Core Types
//!
//! - [`CohortTable`] - sparse `cohort -> period -> value` mapping
//! - [`CohortSizes`] - `cohort -> user count`
//! - [`MetricKind`] - which of the four cohort tables a value belongs to
//! - [`CohortInterval`] - time granularity of cohorts and periods
//! - [`CohortAnalysis`] - the four tables plus sizes and chart references
//! - [`AnalysisResult`] - summary scalars, preview rows and the cohort analysis
//! - [`JobStatusResponse`] / [`JobState`] - export job polling contract

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Sparse cohort table. A missing `(cohort, period)` pair means "no data",
/// never zero.
pub type CohortTable = BTreeMap<String, BTreeMap<String, f64>>;

/// User count per cohort key.
pub type CohortSizes = BTreeMap<String, u64>;

/// One preview row of the uploaded dataset.
pub type PreviewRow = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Retention,
    Revenue,
    Arpu,
    Ltv,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Retention,
        MetricKind::Revenue,
        MetricKind::Arpu,
        MetricKind::Ltv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Retention => "retention",
            MetricKind::Revenue => "revenue",
            MetricKind::Arpu => "arpu",
            MetricKind::Ltv => "ltv",
        }
    }

    /// Retention values are fractions and display as percentages.
    pub fn is_percent(&self) -> bool {
        matches!(self, MetricKind::Retention)
    }

    /// Selects this metric's table from a cohort analysis.
    pub fn table<'a>(&self, analysis: &'a CohortAnalysis) -> Option<&'a CohortTable> {
        match self {
            MetricKind::Retention => analysis.retention_table.as_ref(),
            MetricKind::Revenue => analysis.revenue_table.as_ref(),
            MetricKind::Arpu => analysis.arpu_table.as_ref(),
            MetricKind::Ltv => analysis.ltv_table.as_ref(),
        }
    }

    pub fn section_title(&self) -> &'static str {
        match self {
            MetricKind::Retention => "Retention Analysis",
            MetricKind::Revenue => "Revenue Analysis",
            MetricKind::Arpu => "ARPU (Average Revenue Per User)",
            MetricKind::Ltv => "LTV (Lifetime Value)",
        }
    }

    pub fn table_label(&self) -> &'static str {
        match self {
            MetricKind::Retention => "Retention Table",
            MetricKind::Revenue => "Revenue Table",
            MetricKind::Arpu => "ARPU Table",
            MetricKind::Ltv => "LTV Table",
        }
    }

    pub fn y_axis_label(&self) -> &'static str {
        match self {
            MetricKind::Retention => "Retention (%)",
            MetricKind::Revenue => "Revenue",
            MetricKind::Arpu => "ARPU",
            MetricKind::Ltv => "LTV",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retention" | "retention_table" => Ok(MetricKind::Retention),
            "revenue" | "revenue_table" => Ok(MetricKind::Revenue),
            "arpu" | "arpu_table" => Ok(MetricKind::Arpu),
            "ltv" | "ltv_table" => Ok(MetricKind::Ltv),
            other => anyhow::bail!(
                "Unknown metric '{}', expected one of retention, revenue, arpu, ltv",
                other
            ),
        }
    }
}

/// Cohort time granularity. Unrecognised labels are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CohortInterval {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Other(String),
}

impl CohortInterval {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "daily" => CohortInterval::Daily,
            "weekly" => CohortInterval::Weekly,
            "monthly" => CohortInterval::Monthly,
            "quarterly" => CohortInterval::Quarterly,
            _ => CohortInterval::Other(label.to_string()),
        }
    }

    /// Prefix used for period labels, e.g. "Week" in "Week 3".
    pub fn period_prefix(&self) -> &'static str {
        match self {
            CohortInterval::Daily => "Day",
            CohortInterval::Weekly => "Week",
            CohortInterval::Monthly => "Month",
            CohortInterval::Quarterly => "Quarter",
            CohortInterval::Other(_) => "Period",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CohortInterval::Daily => "daily",
            CohortInterval::Weekly => "weekly",
            CohortInterval::Monthly => "monthly",
            CohortInterval::Quarterly => "quarterly",
            CohortInterval::Other(label) => label,
        }
    }
}

impl fmt::Display for CohortInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartRefs {
    /// Backend-relative path of the rendered heatmap image.
    pub retention_heatmap: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortAnalysis {
    #[serde(default, deserialize_with = "dense_table")]
    pub retention_table: Option<CohortTable>,
    #[serde(default, deserialize_with = "dense_table")]
    pub revenue_table: Option<CohortTable>,
    #[serde(default, deserialize_with = "dense_table")]
    pub arpu_table: Option<CohortTable>,
    #[serde(default, deserialize_with = "dense_table")]
    pub ltv_table: Option<CohortTable>,
    #[serde(default, deserialize_with = "whole_counts")]
    pub cohort_sizes: Option<CohortSizes>,
    pub charts: Option<ChartRefs>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub total_rows: Option<u64>,
    pub columns: Option<Vec<String>>,
    pub date_range: Option<DateRange>,
    pub unique_users: Option<u64>,
    pub total_revenue: Option<f64>,
    pub analysis_type: Option<String>,
    pub analysis_metric: Option<String>,
    pub cohort_interval: Option<String>,
    pub head: Option<Vec<PreviewRow>>,
    pub note: Option<String>,
    pub cohort_analysis: Option<CohortAnalysis>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub insights: Option<Vec<String>>,
}

impl AnalysisResult {
    pub fn interval(&self) -> CohortInterval {
        CohortInterval::parse(self.cohort_interval.as_deref().unwrap_or(""))
    }

    pub fn table(&self, kind: MetricKind) -> Option<&CohortTable> {
        self.cohort_analysis.as_ref().and_then(|a| kind.table(a))
    }

    pub fn cohort_sizes(&self) -> Option<&CohortSizes> {
        self.cohort_analysis.as_ref().and_then(|a| a.cohort_sizes.as_ref())
    }

    pub fn heatmap_path(&self) -> Option<&str> {
        self.cohort_analysis
            .as_ref()
            .and_then(|a| a.charts.as_ref())
            .and_then(|c| c.retention_heatmap.as_deref())
    }
}

/// Envelope returned by `POST /analysis`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub job_id: Option<String>,
    #[serde(default)]
    pub data: AnalysisResult,
    pub chart_data: Option<BTreeMap<String, String>>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub llm_observations: Option<Vec<String>>,
    pub download_url: Option<String>,
}

impl AnalysisResponse {
    /// Parses either a full response envelope or a bare analysis result.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).context("Analysis result is not valid JSON")?;

        if value.get("data").is_some() {
            serde_json::from_value(value).context("Failed to parse analysis response")
        } else {
            let data: AnalysisResult =
                serde_json::from_value(value).context("Failed to parse analysis result")?;
            Ok(Self {
                data,
                ..Self::default()
            })
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaResponse {
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default)]
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    #[serde(default)]
    pub status: String,
    pub download_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Processing,
    Ready,
    Failed,
}

impl JobState {
    /// Unknown status strings yield `None` ("no status yet").
    pub fn parse(status: &str) -> Option<Self> {
        match status {
            "processing" => Some(JobState::Processing),
            "ready" => Some(JobState::Ready),
            "failed" => Some(JobState::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Ready | JobState::Failed)
    }
}

/// Null cells are dropped so a lookup miss is the only "no data" marker.
fn dense_table<'de, D>(deserializer: D) -> std::result::Result<Option<CohortTable>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, BTreeMap<String, Option<f64>>>> =
        Option::deserialize(deserializer)?;

    Ok(raw.map(|table| {
        table
            .into_iter()
            .map(|(cohort, periods)| {
                let cells = periods
                    .into_iter()
                    .filter_map(|(period, value)| value.map(|v| (period, v)))
                    .collect();
                (cohort, cells)
            })
            .collect()
    }))
}

/// Sizes occasionally arrive as floats (`120.0`) from the dataframe layer.
fn whole_counts<'de, D>(deserializer: D) -> std::result::Result<Option<CohortSizes>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Option<f64>>> = Option::deserialize(deserializer)?;

    Ok(raw.map(|sizes| {
        sizes
            .into_iter()
            .filter_map(|(cohort, count)| match count {
                Some(n) if n.is_finite() && n >= 0.0 => Some((cohort, n.round() as u64)),
                _ => None,
            })
            .collect()
    }))
}

/// The backend sends `{}` instead of a list when insight generation fails.
fn lenient_string_list<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_from_str() {
        assert_eq!("retention".parse::<MetricKind>().unwrap(), MetricKind::Retention);
        assert_eq!("ARPU".parse::<MetricKind>().unwrap(), MetricKind::Arpu);
        assert_eq!("ltv_table".parse::<MetricKind>().unwrap(), MetricKind::Ltv);
        assert!("engagement".parse::<MetricKind>().is_err());
    }

    #[test]
    fn test_interval_prefix() {
        assert_eq!(CohortInterval::parse("daily").period_prefix(), "Day");
        assert_eq!(CohortInterval::parse("weekly").period_prefix(), "Week");
        assert_eq!(CohortInterval::parse("monthly").period_prefix(), "Month");
        assert_eq!(CohortInterval::parse("quarterly").period_prefix(), "Quarter");
        assert_eq!(CohortInterval::parse("yearly").period_prefix(), "Period");
        assert_eq!(CohortInterval::parse("").period_prefix(), "Period");
    }

    #[test]
    fn test_null_cells_are_dropped() {
        let json = r#"{"retention_table": {"2024-01-01": {"0": 1.0, "1": null}}}"#;
        let analysis: CohortAnalysis = serde_json::from_str(json).unwrap();
        let table = analysis.retention_table.unwrap();
        assert_eq!(table["2024-01-01"].len(), 1);
        assert_eq!(table["2024-01-01"]["0"], 1.0);
    }

    #[test]
    fn test_float_sizes_are_counts() {
        let json = r#"{"cohort_sizes": {"2024-01-01": 120.0, "2024-02-01": 80}}"#;
        let analysis: CohortAnalysis = serde_json::from_str(json).unwrap();
        let sizes = analysis.cohort_sizes.unwrap();
        assert_eq!(sizes["2024-01-01"], 120);
        assert_eq!(sizes["2024-02-01"], 80);
    }

    #[test]
    fn test_observations_tolerate_object() {
        let json = r#"{"data": {}, "llm_observations": {}}"#;
        let response = AnalysisResponse::from_json(json).unwrap();
        assert!(response.llm_observations.is_none());
    }

    #[test]
    fn test_bare_result_is_accepted() {
        let json = r#"{"total_rows": 10, "cohort_interval": "weekly"}"#;
        let response = AnalysisResponse::from_json(json).unwrap();
        assert_eq!(response.data.total_rows, Some(10));
        assert_eq!(response.data.interval(), CohortInterval::Weekly);
        assert!(response.job_id.is_none());
    }

    #[test]
    fn test_job_state_parse() {
        assert_eq!(JobState::parse("ready"), Some(JobState::Ready));
        assert_eq!(JobState::parse("queued"), None);
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::Processing.is_terminal());
    }
}
