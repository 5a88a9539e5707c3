//! Trend series construction for the multi-line cohort chart.
//!
//! One [`TrendSeriesPoint`] per period, each carrying one value per cohort.
//! Every point has the same cohort fields; a cohort without data at a period
//! holds `None` (serialized as `null`), which is distinct from `0`.

use crate::format::to_fixed;
use crate::matrix::{collect_periods, lookup, ordered_cohorts};
use crate::models::{AnalysisResult, CohortInterval, CohortTable, MetricKind};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeriesPoint {
    /// Human readable period label, e.g. "Week 3".
    pub period: String,
    /// `(cohort, value)` pairs in series order.
    pub values: Vec<(String, Option<f64>)>,
}

impl TrendSeriesPoint {
    /// `None` if the cohort is not part of the chart, `Some(None)` if it has
    /// no data at this period.
    pub fn value(&self, cohort: &str) -> Option<Option<f64>> {
        self.values
            .iter()
            .find(|(name, _)| name == cohort)
            .map(|(_, value)| *value)
    }
}

impl Serialize for TrendSeriesPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("period", &self.period)?;
        for (cohort, value) in &self.values {
            map.serialize_entry(cohort, value)?;
        }
        map.end()
    }
}

/// Build chart points for `table`. No caps are applied.
pub fn build_series(
    table: &CohortTable,
    interval: &str,
    metric: MetricKind,
) -> Vec<TrendSeriesPoint> {
    let prefix = CohortInterval::parse(interval).period_prefix();
    let cohorts = ordered_cohorts(table);

    collect_periods(table)
        .into_iter()
        .map(|period| {
            let values = cohorts
                .iter()
                .map(|&cohort| {
                    let value = lookup(&table[cohort], period)
                        .filter(|v| v.is_finite())
                        .map(|v| chart_value(v, metric));
                    (cohort.to_string(), value)
                })
                .collect();

            TrendSeriesPoint {
                period: format!("{} {}", prefix, period),
                values,
            }
        })
        .collect()
}

fn chart_value(value: f64, metric: MetricKind) -> f64 {
    if metric.is_percent() {
        round2(value * 100.0)
    } else {
        round2(value)
    }
}

/// Two decimals, rounded like the rendered tooltip text.
fn round2(value: f64) -> f64 {
    to_fixed(value, 2).parse().unwrap_or(value)
}

/// Everything the chart widget needs for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendChart {
    pub metric: MetricKind,
    pub y_axis_label: &'static str,
    pub is_percent: bool,
    /// Series names in color-assignment order.
    pub series: Vec<String>,
    pub points: Vec<TrendSeriesPoint>,
    /// True when the illustrative dataset stands in for missing data.
    pub fallback: bool,
}

impl TrendChart {
    pub fn build(result: &AnalysisResult, metric: MetricKind) -> Self {
        let interval = result.cohort_interval.as_deref().unwrap_or("");
        let points = result
            .table(metric)
            .map(|table| build_series(table, interval, metric))
            .unwrap_or_default();

        if points.is_empty() {
            return Self::fallback(metric);
        }

        let series = points[0].values.iter().map(|(name, _)| name.clone()).collect();

        Self {
            metric,
            y_axis_label: metric.y_axis_label(),
            is_percent: metric.is_percent(),
            series,
            points,
            fallback: false,
        }
    }

    /// Illustrative weekly retention curves shown instead of an empty chart.
    pub fn fallback(metric: MetricKind) -> Self {
        const COHORTS: [&str; 3] = ["Jan 2024", "Feb 2024", "Mar 2024"];
        const CURVES: [[f64; 3]; 5] = [
            [100.0, 100.0, 100.0],
            [48.2, 45.7, 52.1],
            [32.1, 28.9, 35.7],
            [28.4, 25.1, 31.2],
            [22.4, 19.3, 24.8],
        ];

        let points = CURVES
            .iter()
            .enumerate()
            .map(|(week, row)| TrendSeriesPoint {
                period: format!("Week {}", week),
                values: COHORTS
                    .iter()
                    .zip(row.iter())
                    .map(|(name, value)| (name.to_string(), Some(*value)))
                    .collect(),
            })
            .collect();

        Self {
            metric,
            y_axis_label: metric.y_axis_label(),
            is_percent: metric.is_percent(),
            series: COHORTS.iter().map(|s| s.to_string()).collect(),
            points,
            fallback: true,
        }
    }
}
