//! Analysis request payload and client-side validation.
//!
//! Field names follow the backend's camelCase contract. [`AnalysisRequest::validate`]
//! rejects requests the backend would refuse, with messages meant for the user.

use crate::cohort_key::CohortKeyParser;
use crate::models::MetricKind;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceType {
    #[default]
    Csv,
    Sql,
    Db,
}

impl DataSourceType {
    /// Rows come from a table behind a connection URL rather than an upload.
    pub fn is_database(self) -> bool {
        matches!(self, DataSourceType::Sql | DataSourceType::Db)
    }
}

impl FromStr for DataSourceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(DataSourceType::Csv),
            "sql" => Ok(DataSourceType::Sql),
            "db" | "database" => Ok(DataSourceType::Db),
            other => anyhow::bail!("Unknown data source '{}', expected csv, sql or db", other),
        }
    }
}

/// How outliers are treated before analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleaningMethod {
    #[default]
    Capping,
    Remove,
}

impl FromStr for CleaningMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "capping" | "cap" => Ok(CleaningMethod::Capping),
            "remove" => Ok(CleaningMethod::Remove),
            other => anyhow::bail!(
                "Unknown cleaning method '{}', expected capping or remove",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataCleaningOptions {
    pub remove: bool,
    pub capping: bool,
}

impl From<CleaningMethod> for DataCleaningOptions {
    fn from(method: CleaningMethod) -> Self {
        Self {
            remove: method == CleaningMethod::Remove,
            capping: method == CleaningMethod::Capping,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullHandlingStrategy {
    pub categorical: String,
    pub numerical: String,
}

impl Default for NullHandlingStrategy {
    fn default() -> Self {
        Self {
            categorical: "most_frequent".to_string(),
            numerical: "mean".to_string(),
        }
    }
}

/// Either a plain on/off switch or per-type fill strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NullHandling {
    Enabled(bool),
    Strategy(NullHandlingStrategy),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprocessingOptions {
    pub data_cleaning: DataCleaningOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_handling: Option<NullHandling>,
    pub type_conversion: bool,
}

impl PreprocessingOptions {
    /// `fill` of `None` leaves nulls untouched.
    pub fn new(
        cleaning: CleaningMethod,
        fill: Option<NullHandlingStrategy>,
        type_conversion: bool,
    ) -> Self {
        Self {
            data_cleaning: cleaning.into(),
            null_handling: fill.map(NullHandling::Strategy),
            type_conversion,
        }
    }
}

impl Default for PreprocessingOptions {
    fn default() -> Self {
        Self::new(
            CleaningMethod::default(),
            Some(NullHandlingStrategy::default()),
            true,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub filename: Option<String>,
    pub user_id: String,
    pub cohort_grouping: String,
    pub event_column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_column: Option<String>,
    pub analysis_metric: String,
    pub cohort_interval: String,
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub data_source_type: DataSourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preprocessing: Option<PreprocessingOptions>,
    #[serde(rename = "llm_insights")]
    pub llm_insights: bool,
}

impl AnalysisRequest {
    /// CSV request with no file chosen yet and default preprocessing.
    pub fn new(
        user_id: impl Into<String>,
        cohort_grouping: impl Into<String>,
        event_column: impl Into<String>,
        analysis_metric: impl Into<String>,
        cohort_interval: impl Into<String>,
    ) -> Self {
        Self {
            filename: None,
            user_id: user_id.into(),
            cohort_grouping: cohort_grouping.into(),
            event_column: event_column.into(),
            revenue_column: None,
            analysis_metric: analysis_metric.into(),
            cohort_interval: cohort_interval.into(),
            columns: Vec::new(),
            start_date: None,
            end_date: None,
            data_source_type: DataSourceType::Csv,
            db_url: None,
            selected_table: None,
            preprocessing: Some(PreprocessingOptions::default()),
            llm_insights: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_source_type == DataSourceType::Csv && is_blank(self.filename.as_deref()) {
            anyhow::bail!("Please upload a CSV file first.");
        }
        if self.data_source_type.is_database()
            && (is_blank(self.db_url.as_deref()) || is_blank(self.selected_table.as_deref()))
        {
            anyhow::bail!("Please provide a database URL and select a table.");
        }

        let required = [
            &self.user_id,
            &self.cohort_grouping,
            &self.event_column,
            &self.analysis_metric,
            &self.cohort_interval,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            anyhow::bail!("Please fill in all required fields.");
        }

        let wants_revenue = self
            .analysis_metric
            .parse::<MetricKind>()
            .map(|m| m == MetricKind::Revenue)
            .unwrap_or(false);
        if wants_revenue && is_blank(self.revenue_column.as_deref()) {
            anyhow::bail!("Please specify the revenue column for revenue analysis.");
        }

        if let (Some(start), Some(end)) = (self.start_date.as_deref(), self.end_date.as_deref()) {
            let start = CohortKeyParser::parse_date(start)
                .map_err(|_| anyhow::anyhow!("Start date is not a valid date: {}", start))?;
            let end = CohortKeyParser::parse_date(end)
                .map_err(|_| anyhow::anyhow!("End date is not a valid date: {}", end))?;
            if start >= end {
                anyhow::bail!("Start date must be before end date.");
            }
        }

        Ok(())
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AnalysisRequest {
        let mut req =
            AnalysisRequest::new("user_id", "signup_date", "event_date", "retention", "monthly");
        req.filename = Some("events.csv".to_string());
        req
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_csv_requires_filename() {
        let mut req = request();
        req.filename = None;
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "Please upload a CSV file first.");

        req.data_source_type = DataSourceType::Db;
        req.db_url = Some("postgresql://localhost/app".to_string());
        req.selected_table = Some("events".to_string());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_database_needs_url_and_table() {
        let mut req = request();
        req.filename = None;
        req.data_source_type = DataSourceType::Db;
        req.db_url = Some("postgresql://localhost/app".to_string());
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "Please provide a database URL and select a table.");

        req.selected_table = Some("events".to_string());
        req.db_url = Some("  ".to_string());
        assert!(req.validate().is_err());

        req.db_url = Some("postgresql://localhost/app".to_string());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_parse_options() {
        assert_eq!("DB".parse::<DataSourceType>().unwrap(), DataSourceType::Db);
        assert_eq!("csv".parse::<DataSourceType>().unwrap(), DataSourceType::Csv);
        assert!("parquet".parse::<DataSourceType>().is_err());
        assert!(DataSourceType::Sql.is_database());
        assert!(!DataSourceType::Csv.is_database());

        assert_eq!("remove".parse::<CleaningMethod>().unwrap(), CleaningMethod::Remove);
        assert!("drop".parse::<CleaningMethod>().is_err());
    }

    #[test]
    fn test_default_preprocessing_payload() {
        let json = serde_json::to_value(&request()).unwrap();
        let pre = &json["preprocessing"];
        assert_eq!(pre["dataCleaning"]["capping"], true);
        assert_eq!(pre["dataCleaning"]["remove"], false);
        assert_eq!(pre["nullHandling"]["categorical"], "most_frequent");
        assert_eq!(pre["nullHandling"]["numerical"], "mean");
        assert_eq!(pre["typeConversion"], true);
        assert!(json.get("dbUrl").is_none());
        assert!(json.get("selectedTable").is_none());
    }

    #[test]
    fn test_database_payload() {
        let mut req = request();
        req.filename = None;
        req.data_source_type = DataSourceType::Db;
        req.db_url = Some("postgresql://localhost/app".to_string());
        req.selected_table = Some("events".to_string());
        req.columns = vec!["user_id".to_string(), "event_date".to_string()];
        req.preprocessing = Some(PreprocessingOptions::new(CleaningMethod::Remove, None, false));

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["dataSourceType"], "db");
        assert_eq!(json["dbUrl"], "postgresql://localhost/app");
        assert_eq!(json["selectedTable"], "events");
        assert_eq!(json["filename"], serde_json::Value::Null);
        assert_eq!(json["columns"], serde_json::json!(["user_id", "event_date"]));
        assert_eq!(json["preprocessing"]["dataCleaning"]["remove"], true);
        assert!(json["preprocessing"].get("nullHandling").is_none());
        assert_eq!(json["preprocessing"]["typeConversion"], false);
    }

    #[test]
    fn test_required_fields() {
        let mut req = request();
        req.cohort_interval = " ".to_string();
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "Please fill in all required fields.");
    }

    #[test]
    fn test_revenue_needs_column() {
        let mut req = request();
        req.analysis_metric = "revenue".to_string();
        let err = req.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please specify the revenue column for revenue analysis."
        );

        req.revenue_column = Some("amount".to_string());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_date_order() {
        let mut req = request();
        req.start_date = Some("2024-03-01".to_string());
        req.end_date = Some("2024-03-01".to_string());
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "Start date must be before end date.");

        req.end_date = Some("2024-04-01".to_string());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_wire_names() {
        let mut req = request();
        req.preprocessing = Some(PreprocessingOptions {
            data_cleaning: DataCleaningOptions { remove: true, capping: false },
            null_handling: Some(NullHandling::Enabled(true)),
            type_conversion: true,
        });
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["userId"], "user_id");
        assert_eq!(json["cohortGrouping"], "signup_date");
        assert_eq!(json["dataSourceType"], "csv");
        assert_eq!(json["llm_insights"], true);
        assert_eq!(json["preprocessing"]["dataCleaning"]["remove"], true);
        assert_eq!(json["preprocessing"]["nullHandling"], true);
        assert!(json.get("revenueColumn").is_none());
    }
}
