//! Column-identity resolution for platform reports.
//!
//! Each platform exports its own column names. A [`SynonymTable`] lists, per
//! platform and per canonical field, the candidate column names in priority
//! order. Resolution binds the first candidate actually present in the dataset.

use crate::error::{BudgetMonitorError, Result};
use crate::schema::{CanonicalField, FieldMapping};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

pub const GOOGLE_ADS: &str = "Google Ads";
pub const META_ADS: &str = "Meta Ads";
pub const TIKTOK_ADS: &str = "TikTok Ads";
pub const LINKEDIN_ADS: &str = "LinkedIn Ads";

pub type FieldSynonyms = BTreeMap<CanonicalField, Vec<String>>;
pub type SynonymTable = BTreeMap<String, FieldSynonyms>;

/// Binds canonical fields to dataset columns for `platform`.
///
/// Fails with `SchemaUnresolved` only when no field at all could be bound,
/// including when the platform has no entry in the table.
pub fn resolve_schema(
    dataset_columns: &BTreeSet<String>,
    platform: &str,
    synonym_table: &SynonymTable,
) -> Result<FieldMapping> {
    // Header cells often carry stray whitespace; match on the trimmed text but
    // bind the dataset's own spelling.
    let trimmed: BTreeMap<&str, &String> = dataset_columns
        .iter()
        .map(|c| (c.trim(), c))
        .collect();

    let mut mapping = FieldMapping::default();

    if let Some(fields) = synonym_table.get(platform) {
        for field in CanonicalField::ALL {
            let Some(candidates) = fields.get(&field) else {
                continue;
            };

            let hit = candidates
                .iter()
                .find_map(|candidate| trimmed.get(candidate.trim()).copied());

            if let Some(column) = hit {
                debug!("{}: bound {} to column '{}'", platform, field, column);
                mapping.bind(field, column.clone());
            }
        }
    } else {
        debug!("No synonym entry for platform '{}'", platform);
    }

    if mapping.is_empty() {
        return Err(BudgetMonitorError::SchemaUnresolved {
            platform: platform.to_string(),
            columns: dataset_columns.iter().cloned().collect(),
        });
    }

    Ok(mapping)
}

/// The built-in table for the four supported ad platforms.
///
/// Callers extend it by inserting new platform entries.
pub fn default_synonym_table() -> SynonymTable {
    let mut table = SynonymTable::new();

    table.insert(
        GOOGLE_ADS.to_string(),
        field_synonyms(
            &["Campaign", "Campaign name", "Campanha Google"],
            &["Budget", "Campaign budget", "Orçamento"],
            &["Cost", "Spend", "Amount spent"],
            &["Campaign status", "Status"],
        ),
    );

    table.insert(
        META_ADS.to_string(),
        field_synonyms(
            &["Campaign name", "Campaign", "Nome da campanha"],
            &["Campaign budget", "Budget", "Orçamento da campanha", "Orçamento"],
            &["Amount spent (BRL)", "Amount spent (USD)", "Amount spent", "Valor usado (BRL)", "Valor usado"],
            &["Campaign delivery", "Delivery", "Veiculação da campanha", "Status"],
        ),
    );

    table.insert(
        TIKTOK_ADS.to_string(),
        field_synonyms(
            &["Campaign name", "Campaign", "Nome da campanha"],
            &["Budget", "Campaign budget", "Orçamento"],
            &["Cost", "Total cost", "Spend", "Custo total"],
            &["Primary status", "Status", "Campaign status"],
        ),
    );

    table.insert(
        LINKEDIN_ADS.to_string(),
        field_synonyms(
            &["Campaign Name", "Campaign", "Nome da campanha"],
            &["Total Budget", "Daily Budget", "Budget", "Orçamento"],
            &["Total Spent", "Amount Spent", "Spend", "Valor gasto"],
            &["Campaign Status", "Status"],
        ),
    );

    table
}

fn field_synonyms(
    campaign: &[&str],
    planned_budget: &[&str],
    actual_spend: &[&str],
    status: &[&str],
) -> FieldSynonyms {
    let to_vec = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    let mut fields = FieldSynonyms::new();
    fields.insert(CanonicalField::Campaign, to_vec(campaign));
    fields.insert(CanonicalField::PlannedBudget, to_vec(planned_budget));
    fields.insert(CanonicalField::ActualSpend, to_vec(actual_spend));
    fields.insert(CanonicalField::Status, to_vec(status));
    fields
}
