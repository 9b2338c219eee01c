use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AttributionError, AttributionResult};

/// Item field names shared by every funnel stage.
pub mod fields {
    pub const REVENUE: &str = "revenue";
    pub const INFLUENCED_REVENUE: &str = "influencedRevenue";
    pub const PIPELINE: &str = "pipeline";
    pub const LTV: &str = "LTV";
}

/// One step of the marketing funnel. The serialized form is the item field
/// holding the stage's indicator count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageKey {
    #[serde(rename = "webVisits")]
    WebVisits,
    #[default]
    #[serde(rename = "MCL")]
    Mcl,
    #[serde(rename = "MQL")]
    Mql,
    #[serde(rename = "SQL")]
    Sql,
    #[serde(rename = "opps")]
    Opps,
    #[serde(rename = "users")]
    Users,
}

impl StageKey {
    /// Funnel order, top to bottom.
    pub const ALL: [StageKey; 6] = [
        StageKey::WebVisits,
        StageKey::Mcl,
        StageKey::Mql,
        StageKey::Sql,
        StageKey::Opps,
        StageKey::Users,
    ];

    pub fn data_key(&self) -> &'static str {
        match self {
            StageKey::WebVisits => "webVisits",
            StageKey::Mcl => "MCL",
            StageKey::Mql => "MQL",
            StageKey::Sql => "SQL",
            StageKey::Opps => "opps",
            StageKey::Users => "users",
        }
    }

    /// Field holding the number of conversion journeys the item touched.
    pub fn influenced_data_key(&self) -> &'static str {
        match self {
            StageKey::WebVisits => "influencedWebVisits",
            StageKey::Mcl => "influencedMCL",
            StageKey::Mql => "influencedMQL",
            StageKey::Sql => "influencedSQL",
            StageKey::Opps => "influencedOpps",
            StageKey::Users => "influencedUsers",
        }
    }

    pub fn singular_nickname(&self) -> &'static str {
        match self {
            StageKey::WebVisits => "Identified Visitor",
            StageKey::Mcl => "MCL",
            StageKey::Mql => "MQL",
            StageKey::Sql => "SQL",
            StageKey::Opps => "Opportunity",
            StageKey::Users => "Paying Account",
        }
    }

    pub fn plural_nickname(&self) -> &'static str {
        match self {
            StageKey::WebVisits => "Identified Visitors",
            StageKey::Mcl => "MCLs",
            StageKey::Mql => "MQLs",
            StageKey::Sql => "SQLs",
            StageKey::Opps => "Opportunities",
            StageKey::Users => "Paying Accounts",
        }
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.data_key())
    }
}

impl FromStr for StageKey {
    type Err = AttributionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageKey::ALL
            .into_iter()
            .find(|stage| stage.data_key() == s)
            .ok_or_else(|| AttributionError::UnknownStage(s.to_string()))
    }
}

/// Read access to an attributed entity (channel, campaign, content piece).
pub trait AttributionItem {
    /// Numeric field by name, `None` when the item does not carry it.
    fn metric(&self, key: &str) -> Option<f64>;
}

/// Row title as returned by the caller's title accessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTitle {
    /// Display label.
    pub label: String,
    /// Plain text used when sorting.
    pub text: String,
}

impl ItemTitle {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }

    /// Title whose label and sort text are the same string.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            label: text.clone(),
            text,
        }
    }
}

/// A generic attributed record: a title, an optional cost and any other
/// fields the caller keeps on it. Only numeric fields are read as metrics;
/// `null`, strings and nested values are carried but never counted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributionRow {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl AttributionRow {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Non-finite values are stored as `null`.
    pub fn with_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.fields.insert(key.into(), Value::from(value));
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Reads a JSON array of rows.
pub fn read_rows(reader: impl Read) -> AttributionResult<Vec<AttributionRow>> {
    Ok(serde_json::from_reader(reader)?)
}

/// Reads a JSON array of rows from a file.
pub fn load_rows(path: &Path) -> AttributionResult<Vec<AttributionRow>> {
    let file = File::open(path)?;
    read_rows(BufReader::new(file))
}

impl AttributionItem for AttributionRow {
    fn metric(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_key_round_trips_through_data_key() {
        for stage in StageKey::ALL {
            assert_eq!(stage.data_key().parse::<StageKey>().unwrap(), stage);
        }
        assert!(matches!(
            "leads".parse::<StageKey>(),
            Err(AttributionError::UnknownStage(s)) if s == "leads"
        ));
    }

    #[test]
    fn test_stage_key_serde_uses_data_key() {
        let json = serde_json::to_string(&StageKey::Opps).unwrap();
        assert_eq!(json, "\"opps\"");
        let parsed: StageKey = serde_json::from_str("\"MQL\"").unwrap();
        assert_eq!(parsed, StageKey::Mql);
    }

    #[test]
    fn test_web_visits_nicknames() {
        assert_eq!(StageKey::WebVisits.singular_nickname(), "Identified Visitor");
        assert_eq!(StageKey::WebVisits.plural_nickname(), "Identified Visitors");
    }

    #[test]
    fn test_row_deserializes_flattened_metrics() {
        let row: AttributionRow = serde_json::from_str(
            r#"{"title": "Google Ads", "cost": 1200.5, "MCL": 12, "influencedMCL": 30, "revenue": 4000}"#,
        )
        .unwrap();
        assert_eq!(row.title, "Google Ads");
        assert_eq!(row.cost, Some(1200.5));
        assert_eq!(row.metric("MCL"), Some(12.0));
        assert_eq!(row.metric("influencedMCL"), Some(30.0));
        assert_eq!(row.metric(fields::PIPELINE), None);
    }

    #[test]
    fn test_null_metric_reads_as_absent() {
        let row: AttributionRow =
            serde_json::from_str(r#"{"title": "a", "MCL": null, "revenue": 5}"#).unwrap();
        assert_eq!(row.metric("MCL"), None);
        assert_eq!(row.metric(fields::REVENUE), Some(5.0));
    }

    #[test]
    fn test_non_numeric_fields_are_kept_but_not_metrics() {
        let row: AttributionRow = serde_json::from_str(
            r#"{"title": "a", "channel": "google", "id": 42, "tags": ["paid"], "MCL": 3}"#,
        )
        .unwrap();
        assert_eq!(row.metric("MCL"), Some(3.0));
        assert_eq!(row.metric("channel"), None);
        assert_eq!(row.metric("tags"), None);
        assert_eq!(row.fields["channel"], "google");

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["channel"], "google");
    }

    #[test]
    fn test_with_metric_drops_non_finite_values() {
        let row = AttributionRow::new("a")
            .with_metric("MCL", f64::NAN)
            .with_field("channel", "email");
        assert_eq!(row.metric("MCL"), None);
        assert_eq!(row.fields["channel"], "email");
    }

    #[test]
    fn test_read_rows_accepts_mixed_records() {
        let data = r#"[
            {"title": "Google Ads", "cost": null, "channel": "paid", "MCL": 4},
            {"title": "Direct", "MCL": null}
        ]"#;
        let rows = read_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cost, None);
        assert_eq!(rows[0].metric("MCL"), Some(4.0));
        assert_eq!(rows[1].metric("MCL"), None);
    }

    #[test]
    fn test_read_rows_rejects_non_array() {
        let err = read_rows(r#"{"title": "a"}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, AttributionError::Serialization(_)));
    }

    #[test]
    fn test_load_rows_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("funnel-attribution-missing-dataset.json");
        let err = load_rows(&path).unwrap_err();
        assert!(matches!(err, AttributionError::Io(_)));
    }
}
