#![allow(dead_code)]

use anyhow::Result;
use cohort_dashboard::models::CohortTable;
use std::fs;
use std::path::{Path, PathBuf};

/// Analysis envelope with all four tables, two monthly cohorts and a
/// missing cell in the newer cohort.
pub const SAMPLE_RESPONSE: &str = r#"{
  "job_id": "job-123",
  "data": {
    "total_rows": 1500,
    "columns": ["user_id", "timestamp", "amount"],
    "date_range": {"start": "2024-01-01", "end": "2024-03-31"},
    "unique_users": 300,
    "total_revenue": 1234.5,
    "analysis_type": "retention",
    "analysis_metric": "retention",
    "cohort_interval": "monthly",
    "head": [
      {"user_id": "u1", "timestamp": "2024-01-03T10:00:00Z", "amount": 12.5},
      {"user_id": "u2", "timestamp": null, "amount": 3}
    ],
    "cohort_analysis": {
      "retention_table": {
        "2024-01-01": {"0": 1.0, "1": 0.482, "2": 0.321},
        "2024-02-01": {"0": 1.0, "1": 0.457}
      },
      "revenue_table": {
        "2024-01-01": {"0": 1234.5, "1": 800.0},
        "2024-02-01": {"0": 950.25}
      },
      "arpu_table": {
        "2024-01-01": {"0": 6.17},
        "2024-02-01": {"0": 9.5}
      },
      "ltv_table": {
        "2024-01-01": {"0": 6.17, "1": 10.17},
        "2024-02-01": {"0": 9.5}
      },
      "cohort_sizes": {"2024-01-01": 200, "2024-02-01": 100},
      "charts": {"retention_heatmap": "/static/charts/heatmap.png"}
    }
  },
  "llm_observations": ["* January retains best", "Revenue concentrates in month 0"]
}"#;

pub fn write_fixture(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(filename);
    fs::write(&path, content)?;
    Ok(path)
}

/// Build a table from `(cohort, [(period, value)])` literals.
pub fn table(entries: &[(&str, &[(&str, f64)])]) -> CohortTable {
    entries
        .iter()
        .map(|(cohort, cells)| {
            (
                cohort.to_string(),
                cells.iter().map(|(p, v)| (p.to_string(), *v)).collect(),
            )
        })
        .collect()
}

/// `cohorts` x `periods` table with every cell filled.
pub fn full_table(cohorts: usize, periods: usize) -> CohortTable {
    (0..cohorts)
        .map(|c| {
            let year = 2020 + c / 12;
            let month = c % 12 + 1;
            let cells = (0..periods)
                .map(|p| (p.to_string(), 1.0 / (p as f64 + 1.0)))
                .collect();
            (format!("{}-{:02}-01", year, month), cells)
        })
        .collect()
}
