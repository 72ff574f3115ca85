use crate::error::{BudgetMonitorError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Placeholder used when a campaign or platform name cannot be read from a row.
pub const NOT_AVAILABLE: &str = "N/A";

/// A single untyped cell as it came out of the source report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Empty,
}

impl RawValue {
    /// Text view of the cell. Empty cells and blank strings yield `None`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Number(n) => Some(n.to_string()),
            RawValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            RawValue::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_text().is_none()
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            RawValue::Empty
        } else {
            RawValue::Text(value.to_string())
        }
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            RawValue::Empty
        } else {
            RawValue::Text(value)
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

pub type RawRow = BTreeMap<String, RawValue>;

/// An ingested report: rows keyed by whatever column names the source used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawDataset {
    /// Column names in order of first appearance.
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawDataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a dataset from loose rows, collecting columns as they first appear.
    pub fn from_rows(rows: Vec<RawRow>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn push_row(&mut self, row: RawRow) {
        for key in row.keys() {
            if !self.columns.contains(key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn column_set(&self) -> BTreeSet<String> {
        self.columns.iter().cloned().collect()
    }
}

/// The four semantic roles every platform's columns are mapped onto.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Campaign,
    PlannedBudget,
    ActualSpend,
    Status,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 4] = [
        CanonicalField::Campaign,
        CanonicalField::PlannedBudget,
        CanonicalField::ActualSpend,
        CanonicalField::Status,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Campaign => "campaign",
            CanonicalField::PlannedBudget => "planned_budget",
            CanonicalField::ActualSpend => "actual_spend",
            CanonicalField::Status => "status",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical field → source column chosen for one dataset.
///
/// Every bound column exists in the dataset the mapping was built for. Unbound
/// fields are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct FieldMapping {
    bindings: BTreeMap<CanonicalField, String>,
}

impl FieldMapping {
    /// User-chosen columns, used verbatim once each is confirmed to exist.
    pub fn explicit<I, S>(dataset: &RawDataset, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (CanonicalField, S)>,
        S: Into<String>,
    {
        let mut mapping = Self::default();
        for (field, column) in pairs {
            let column = column.into();
            if !dataset.has_column(&column) {
                return Err(BudgetMonitorError::ColumnNotFound { column });
            }
            mapping.bindings.insert(field, column);
        }
        Ok(mapping)
    }

    pub(crate) fn bind(&mut self, field: CanonicalField, column: String) {
        self.bindings.insert(field, column);
    }

    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.bindings.get(&field).map(String::as_str)
    }

    pub fn is_bound(&self, field: CanonicalField) -> bool {
        self.bindings.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &str)> {
        self.bindings.iter().map(|(f, c)| (*f, c.as_str()))
    }
}

/// Result of coercing a cell into a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "raw", rename_all = "snake_case")]
pub enum NumericValue {
    Value(f64),
    /// Field unmapped or cell empty.
    Missing,
    /// Cell present but not a finite, non-negative number.
    Unparseable(String),
}

impl NumericValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            NumericValue::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_unparseable(&self) -> bool {
        matches!(self, NumericValue::Unparseable(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CampaignRecord {
    #[schemars(description = "Zero-based position of the source row in the dataset")]
    pub row_index: usize,
    pub platform: String,
    pub campaign: String,
    pub planned_budget: NumericValue,
    pub actual_spend: NumericValue,
    pub status: Option<String>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[schemars(description = "Spend is well beyond the budget target")]
    Critical,

    #[schemars(description = "Spend has passed the budget target")]
    OverBudget,

    #[schemars(description = "Spend is approaching the budget target")]
    NearLimit,

    #[schemars(description = "Campaign is spending far less than planned")]
    LowSpend,
}

impl Severity {
    /// Urgency order; `LowSpend` flags underspend and comes last.
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::OverBudget,
        Severity::NearLimit,
        Severity::LowSpend,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::OverBudget => "OVER_BUDGET",
            Severity::NearLimit => "NEAR_LIMIT",
            Severity::LowSpend => "LOW_SPEND",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Alert {
    pub severity: Severity,
    pub platform: String,
    pub campaign: String,

    #[schemars(description = "The budget target the spend was compared against")]
    pub planned_budget: f64,

    pub actual_spend: f64,

    #[schemars(description = "100 * actual_spend / planned_budget")]
    pub spend_ratio_pct: f64,

    pub message: String,
}

impl Alert {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Alert)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> RawDataset {
        let mut row = RawRow::new();
        row.insert("Campaign".to_string(), RawValue::from("Brand"));
        row.insert("Cost".to_string(), RawValue::from(120.0));
        RawDataset::from_rows(vec![row])
    }

    #[test]
    fn test_explicit_mapping_rejects_unknown_column() {
        let ds = dataset();
        let err = FieldMapping::explicit(&ds, [(CanonicalField::ActualSpend, "Spend")]).unwrap_err();
        assert!(matches!(err, BudgetMonitorError::ColumnNotFound { ref column } if column == "Spend"));

        let mapping = FieldMapping::explicit(
            &ds,
            [
                (CanonicalField::Campaign, "Campaign"),
                (CanonicalField::ActualSpend, "Cost"),
            ],
        )
        .unwrap();
        assert_eq!(mapping.get(CanonicalField::ActualSpend), Some("Cost"));
        assert!(!mapping.is_bound(CanonicalField::Status));
    }

    #[test]
    fn test_raw_value_text_view() {
        assert_eq!(RawValue::from("  ").as_text(), None);
        assert_eq!(RawValue::Empty.as_text(), None);
        assert_eq!(RawValue::from(" Brand ").as_text().as_deref(), Some("Brand"));
    }

    #[test]
    fn test_alert_serialization_shape() {
        let alert = Alert {
            severity: Severity::OverBudget,
            platform: "Meta Ads".to_string(),
            campaign: "Retargeting".to_string(),
            planned_budget: 1000.0,
            actual_spend: 1050.0,
            spend_ratio_pct: 105.0,
            message: "BUDGET EXCEEDED: 105.0%".to_string(),
        };

        let json = serde_json::to_string(&alert).unwrap();
        assert!(json.contains("\"severity\":\"OVER_BUDGET\""));

        let back: Alert = serde_json::from_str(&json).unwrap();
        assert_eq!(back, alert);
    }

    #[test]
    fn test_alert_schema_generation() {
        let schema_json = Alert::schema_as_json().unwrap();
        assert!(schema_json.contains("spend_ratio_pct"));
        assert!(schema_json.contains("LOW_SPEND"));
    }
}
