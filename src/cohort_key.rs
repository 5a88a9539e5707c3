use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::cmp::Ordering;

/// Interprets cohort and period keys coming from the analysis backend.
///
/// Cohort keys are usually dates (`2024-01-01`, `2024-01`, or a full ISO
/// timestamp), but any identifier is accepted. Period keys are non-negative
/// integer offsets encoded as strings.
pub struct CohortKeyParser;

impl CohortKeyParser {
    /// Parse a cohort key into the calendar date it represents.
    pub fn parse_date(key: &str) -> Result<NaiveDate> {
        let key = key.trim();

        if let Ok(date) = NaiveDate::parse_from_str(key, "%Y-%m-%d") {
            return Ok(date);
        }

        if let Ok(dt) = Self::parse_timestamp(key) {
            return Ok(dt.date_naive());
        }

        // Month buckets, e.g. "2024-01"
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", key), "%Y-%m-%d") {
            return Ok(date);
        }

        if let Ok(date) = NaiveDate::parse_from_str(key, "%Y/%m/%d") {
            return Ok(date);
        }

        anyhow::bail!("Cohort key is not a date: {}", key)
    }

    /// Parse a timestamp string into a DateTime<Utc>.
    /// Handles both Z suffix and timezone info formats.
    pub fn parse_timestamp(timestamp_str: &str) -> Result<DateTime<Utc>> {
        let timestamp = if timestamp_str.ends_with('Z') {
            timestamp_str.replace('Z', "+00:00")
        } else {
            timestamp_str.to_string()
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&timestamp) {
            return Ok(dt.with_timezone(&Utc));
        }

        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(&timestamp, format) {
                return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
            }
        }

        anyhow::bail!("Failed to parse timestamp: {}", timestamp_str)
    }

    /// Parse a period key. Negative, fractional or non-numeric keys yield `None`.
    pub fn parse_period(key: &str) -> Option<u32> {
        key.trim().parse::<u32>().ok()
    }

    /// Order cohort keys by date; keys that are not dates go last, in
    /// lexicographic order.
    pub fn compare(a: &str, b: &str) -> Ordering {
        match (Self::parse_date(a).ok(), Self::parse_date(b).ok()) {
            (Some(da), Some(db)) => da.cmp(&db).then_with(|| a.cmp(b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }

    /// Sort keys with [`CohortKeyParser::compare`], parsing each key once.
    pub fn sort<'a, I>(keys: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut keyed: Vec<(Option<NaiveDate>, &str)> = keys
            .into_iter()
            .map(|k| (Self::parse_date(k).ok(), k))
            .collect();

        keyed.sort_by(|(da, a), (db, b)| match (da, db) {
            (Some(da), Some(db)) => da.cmp(db).then_with(|| a.cmp(b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        });

        keyed.into_iter().map(|(_, k)| k).collect()
    }

    /// Row label for a cohort: "Jan 2024" for dated keys, the raw key otherwise.
    pub fn display_label(key: &str) -> String {
        match Self::parse_date(key) {
            Ok(date) => date.format("%b %Y").to_string(),
            Err(_) => key.to_string(),
        }
    }
}
