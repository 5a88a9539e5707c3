//! Rendering-ready view model.
//!
//! Everything here is plain data: strings already formatted, cells already
//! padded out to the column list. The text renderer and the JSON output both
//! consume these types.

use crate::models::MetricKind;
use crate::trends::TrendChart;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    Default,
    Destructive,
}

/// Transient user-facing message, the terminal analogue of a toast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
}

impl Notification {
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            description: description.into(),
            variant: NotificationVariant::Destructive,
        }
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NotificationVariant::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCard {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    pub title: String,
    pub date_range: Option<String>,
    pub cards: Vec<SummaryCard>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixRowView {
    pub cohort: String,
    pub label: String,
    pub users: u64,
    /// One formatted cell per period header; empty string for no data.
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixView {
    pub kind: MetricKind,
    pub title: &'static str,
    pub expanded: bool,
    pub cohort_header: String,
    pub period_headers: Vec<String>,
    /// Empty while the section is collapsed.
    pub rows: Vec<MatrixRowView>,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapView {
    /// `None` until an analysis produced a heatmap.
    pub image_url: Option<String>,
    pub interval: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationsView {
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One full dashboard frame. A section that failed to build is `None` (or
/// missing from `matrices`) and has a matching entry in `notifications`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardView {
    pub has_result: bool,
    pub summary: Option<SummaryView>,
    pub matrices: Vec<MatrixView>,
    pub preview: Option<PreviewView>,
    pub heatmap: Option<HeatmapView>,
    pub trends: Option<TrendChart>,
    pub observations: Option<ObservationsView>,
    pub download_url: Option<String>,
    pub notifications: Vec<Notification>,
}
