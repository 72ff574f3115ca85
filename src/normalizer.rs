use crate::schema::{
    CampaignRecord, CanonicalField, FieldMapping, NumericValue, RawDataset, RawRow, RawValue,
    NOT_AVAILABLE,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Status tokens (English and Portuguese) that take a campaign out of evaluation.
pub const INACTIVE_STATUS_TOKENS: [&str; 4] = ["paused", "inactive", "pausada", "inativa"];

/// Where a record's platform name comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformSource {
    /// Every row belongs to one platform (one report per platform).
    Fixed(String),
    /// A column of the sheet names the platform per row.
    Column(String),
}

/// Projects every row onto the canonical record shape.
///
/// Row order is preserved and no row is dropped; rows that cannot be evaluated
/// are filtered later, at classification time.
pub fn normalize(
    dataset: &RawDataset,
    mapping: &FieldMapping,
    platform: &PlatformSource,
) -> Vec<CampaignRecord> {
    dataset
        .rows
        .iter()
        .enumerate()
        .map(|(row_index, row)| normalize_row(row_index, row, mapping, platform))
        .collect()
}

fn normalize_row(
    row_index: usize,
    row: &RawRow,
    mapping: &FieldMapping,
    platform: &PlatformSource,
) -> CampaignRecord {
    let platform = match platform {
        PlatformSource::Fixed(name) => name.clone(),
        PlatformSource::Column(column) => text_cell(row, Some(column.as_str()))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    };

    let campaign = text_cell(row, mapping.get(CanonicalField::Campaign))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let planned_budget = numeric_cell(row, mapping.get(CanonicalField::PlannedBudget));
    let actual_spend = numeric_cell(row, mapping.get(CanonicalField::ActualSpend));

    if planned_budget.is_unparseable() || actual_spend.is_unparseable() {
        debug!(
            "Row {} ({} / {}): numeric coercion failed (budget: {:?}, spend: {:?})",
            row_index, platform, campaign, planned_budget, actual_spend
        );
    }

    CampaignRecord {
        row_index,
        platform,
        campaign,
        planned_budget,
        actual_spend,
        status: text_cell(row, mapping.get(CanonicalField::Status)),
    }
}

fn text_cell(row: &RawRow, column: Option<&str>) -> Option<String> {
    column.and_then(|c| row.get(c)).and_then(RawValue::as_text)
}

fn numeric_cell(row: &RawRow, column: Option<&str>) -> NumericValue {
    match column.and_then(|c| row.get(c)) {
        Some(value) => coerce_numeric(value),
        None => NumericValue::Missing,
    }
}

/// Numeric coercion for a single cell.
///
/// Empty cells are `Missing`. Anything that is not a finite, non-negative number
/// is `Unparseable`, carrying the raw text for traceability.
pub fn coerce_numeric(value: &RawValue) -> NumericValue {
    match value {
        RawValue::Empty => NumericValue::Missing,
        RawValue::Number(n) => checked(*n, || n.to_string()),
        RawValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return NumericValue::Missing;
            }
            match trimmed.parse::<f64>() {
                Ok(n) => checked(n, || trimmed.to_string()),
                Err(_) => NumericValue::Unparseable(trimmed.to_string()),
            }
        }
    }
}

fn checked(n: f64, raw: impl FnOnce() -> String) -> NumericValue {
    if n.is_finite() && n >= 0.0 {
        NumericValue::Value(n)
    } else {
        NumericValue::Unparseable(raw())
    }
}

/// Case-insensitive substring match against [`INACTIVE_STATUS_TOKENS`].
pub fn is_inactive_status(status: &str) -> bool {
    let lowered = status.to_lowercase();
    INACTIVE_STATUS_TOKENS
        .iter()
        .any(|token| lowered.contains(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, RawValue)]) -> RawRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn sheet() -> RawDataset {
        RawDataset::from_rows(vec![
            row(&[
                ("Platform", "Google Ads".into()),
                ("Campaign", "Search - Brand".into()),
                ("Spend", "1200.50".into()),
                ("Status", "Active".into()),
            ]),
            row(&[
                ("Platform", "".into()),
                ("Campaign", "".into()),
                ("Spend", "n/a".into()),
                ("Status", "Paused".into()),
            ]),
            row(&[
                ("Platform", "Meta Ads".into()),
                ("Campaign", "Prospecting".into()),
                ("Spend", RawValue::Number(300.0)),
            ]),
        ])
    }

    #[test]
    fn test_normalize_preserves_rows_and_order() {
        let ds = sheet();
        let mapping = FieldMapping::explicit(
            &ds,
            [
                (CanonicalField::Campaign, "Campaign"),
                (CanonicalField::ActualSpend, "Spend"),
                (CanonicalField::Status, "Status"),
            ],
        )
        .unwrap();

        let records = normalize(&ds, &mapping, &PlatformSource::Column("Platform".to_string()));
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].row_index, 0);
        assert_eq!(records[0].platform, "Google Ads");
        assert_eq!(records[0].actual_spend, NumericValue::Value(1200.5));
        assert_eq!(records[0].planned_budget, NumericValue::Missing);

        assert_eq!(records[1].platform, NOT_AVAILABLE);
        assert_eq!(records[1].campaign, NOT_AVAILABLE);
        assert_eq!(records[1].actual_spend, NumericValue::Unparseable("n/a".to_string()));
        assert_eq!(records[1].status.as_deref(), Some("Paused"));

        assert_eq!(records[2].actual_spend, NumericValue::Value(300.0));
        assert_eq!(records[2].status, None);
    }

    #[test]
    fn test_fixed_platform_source() {
        let ds = sheet();
        let mapping = FieldMapping::explicit(&ds, [(CanonicalField::ActualSpend, "Spend")]).unwrap();
        let records = normalize(&ds, &mapping, &PlatformSource::Fixed("TikTok Ads".to_string()));
        assert!(records.iter().all(|r| r.platform == "TikTok Ads"));
        assert!(records.iter().all(|r| r.campaign == NOT_AVAILABLE));
    }

    #[test]
    fn test_numeric_campaign_cell_becomes_text() {
        let ds = RawDataset::from_rows(vec![
            row(&[
                ("Campaign", RawValue::Number(2024.0)),
                ("Spend", RawValue::Number(150.0)),
            ]),
            row(&[
                ("Campaign", RawValue::Number(12.5)),
                ("Spend", "80".into()),
            ]),
        ]);
        let mapping = FieldMapping::explicit(
            &ds,
            [
                (CanonicalField::Campaign, "Campaign"),
                (CanonicalField::ActualSpend, "Spend"),
            ],
        )
        .unwrap();

        let records = normalize(&ds, &mapping, &PlatformSource::Fixed("Meta Ads".to_string()));
        assert_eq!(records[0].campaign, "2024");
        assert_eq!(records[1].campaign, "12.5");
        assert_eq!(records[0].actual_spend, NumericValue::Value(150.0));
    }

    #[test]
    fn test_coerce_numeric_edge_cases() {
        assert_eq!(coerce_numeric(&RawValue::Empty), NumericValue::Missing);
        assert_eq!(coerce_numeric(&"   ".into()), NumericValue::Missing);
        assert_eq!(coerce_numeric(&" 42 ".into()), NumericValue::Value(42.0));
        assert!(coerce_numeric(&"-5".into()).is_unparseable());
        assert!(coerce_numeric(&"NaN".into()).is_unparseable());
        assert!(coerce_numeric(&RawValue::Number(f64::INFINITY)).is_unparseable());
        assert!(coerce_numeric(&"R$ 1.000,00".into()).is_unparseable());
    }

    #[test]
    fn test_inactive_status_tokens() {
        assert!(is_inactive_status("Paused"));
        assert!(is_inactive_status("INACTIVE"));
        assert!(is_inactive_status("Campanha pausada"));
        assert!(is_inactive_status("Inativa"));
        assert!(!is_inactive_status("Active"));
        assert!(!is_inactive_status("Ativa"));
    }
}
