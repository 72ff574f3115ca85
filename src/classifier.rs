//! Spend-ratio classification.
//!
//! A [`ThresholdProfile`] is an ordered list of `(lower_bound, severity)` tiers
//! checked from the highest bound down, plus a separate low-spend rule. The first
//! tier the ratio matches wins, so a record can only ever land in one bucket.

use crate::error::{BudgetMonitorError, Result};
use crate::normalizer::is_inactive_status;
use crate::overrides::BudgetOverrides;
use crate::schema::{Alert, CampaignRecord, NumericValue, Severity};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThresholdTier {
    #[schemars(description = "Ratio (in percent) the spend must exceed")]
    pub lower_bound: f64,
    pub severity: Severity,
    #[schemars(description = "When true the tier also matches a ratio equal to the bound")]
    #[serde(default)]
    pub inclusive: bool,
}

impl ThresholdTier {
    pub fn above(lower_bound: f64, severity: Severity) -> Self {
        Self {
            lower_bound,
            severity,
            inclusive: false,
        }
    }

    pub fn at_or_above(lower_bound: f64, severity: Severity) -> Self {
        Self {
            lower_bound,
            severity,
            inclusive: true,
        }
    }

    pub fn matches(&self, ratio_pct: f64) -> bool {
        if self.inclusive {
            ratio_pct >= self.lower_bound
        } else {
            ratio_pct > self.lower_bound
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LowSpendRule {
    #[schemars(description = "Ratio (in percent) the spend must stay strictly below, with spend > 0")]
    pub below: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThresholdProfile {
    pub name: String,
    /// Sorted by strictly descending `lower_bound`.
    pub tiers: Vec<ThresholdTier>,
    pub low_spend: Option<LowSpendRule>,
}

impl ThresholdProfile {
    /// Tiers used when one spreadsheet covers every platform.
    ///
    /// Spending exactly the budget already counts as OVER_BUDGET.
    pub fn single_sheet() -> Self {
        Self {
            name: "single_sheet".to_string(),
            tiers: vec![
                ThresholdTier::above(110.0, Severity::Critical),
                ThresholdTier::at_or_above(100.0, Severity::OverBudget),
                ThresholdTier::above(90.0, Severity::NearLimit),
            ],
            low_spend: Some(LowSpendRule { below: 30.0 }),
        }
    }

    /// Tiers used for per-platform reports. There is no OVER_BUDGET tier here.
    pub fn multi_platform() -> Self {
        Self {
            name: "multi_platform".to_string(),
            tiers: vec![
                ThresholdTier::above(110.0, Severity::Critical),
                ThresholdTier::above(95.0, Severity::NearLimit),
            ],
            low_spend: Some(LowSpendRule { below: 50.0 }),
        }
    }

    pub fn custom(
        name: impl Into<String>,
        tiers: Vec<ThresholdTier>,
        low_spend: Option<LowSpendRule>,
    ) -> Result<Self> {
        let profile = Self {
            name: name.into(),
            tiers,
            low_spend,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        for (idx, tier) in self.tiers.iter().enumerate() {
            if !tier.lower_bound.is_finite() {
                return Err(BudgetMonitorError::InvalidProfile(format!(
                    "{}: tier #{} has a non-finite bound",
                    self.name, idx
                )));
            }
            if tier.severity == Severity::LowSpend {
                return Err(BudgetMonitorError::InvalidProfile(format!(
                    "{}: LOW_SPEND is configured through the low-spend rule, not as a tier",
                    self.name
                )));
            }
            if idx > 0 && tier.lower_bound >= self.tiers[idx - 1].lower_bound {
                return Err(BudgetMonitorError::InvalidProfile(format!(
                    "{}: tier bounds must be strictly descending ({} follows {})",
                    self.name,
                    tier.lower_bound,
                    self.tiers[idx - 1].lower_bound
                )));
            }
        }

        if let Some(rule) = &self.low_spend {
            if !rule.below.is_finite() {
                return Err(BudgetMonitorError::InvalidProfile(format!(
                    "{}: low-spend bound must be finite",
                    self.name
                )));
            }
        }

        Ok(())
    }

    /// Severity for a ratio, or `None` when the spend is within the normal band.
    pub fn severity_for(&self, ratio_pct: f64, actual_spend: f64) -> Option<Severity> {
        if let Some(tier) = self.tiers.iter().find(|t| t.matches(ratio_pct)) {
            return Some(tier.severity);
        }

        match &self.low_spend {
            Some(rule) if ratio_pct < rule.below && actual_spend > 0.0 => Some(Severity::LowSpend),
            _ => None,
        }
    }
}

/// Built-in profile selection, as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    #[default]
    SingleSheet,
    MultiPlatform,
}

impl ProfileKind {
    pub fn profile(&self) -> ThresholdProfile {
        match self {
            ProfileKind::SingleSheet => ThresholdProfile::single_sheet(),
            ProfileKind::MultiPlatform => ThresholdProfile::multi_platform(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageLanguage {
    #[default]
    English,
    Portuguese,
}

/// Human-readable alert text. The ratio is always shown with one decimal.
pub fn alert_message(severity: Severity, ratio_pct: f64, language: MessageLanguage) -> String {
    match (language, severity) {
        (MessageLanguage::English, Severity::Critical) => {
            format!("SPEND EXCEEDED: {:.1}% of budget", ratio_pct)
        }
        (MessageLanguage::English, Severity::OverBudget) => {
            format!("BUDGET EXCEEDED: {:.1}%", ratio_pct)
        }
        (MessageLanguage::English, Severity::NearLimit) => format!("NEAR LIMIT: {:.1}%", ratio_pct),
        (MessageLanguage::English, Severity::LowSpend) => {
            format!("LOW SPEND: {:.1}% used", ratio_pct)
        }
        (MessageLanguage::Portuguese, Severity::Critical) => {
            format!("GASTO EXCEDIDO: {:.1}% do orçamento", ratio_pct)
        }
        (MessageLanguage::Portuguese, Severity::OverBudget) => {
            format!("ORÇAMENTO ULTRAPASSADO: {:.1}%", ratio_pct)
        }
        (MessageLanguage::Portuguese, Severity::NearLimit) => {
            format!("PRÓXIMO DO LIMITE: {:.1}%", ratio_pct)
        }
        (MessageLanguage::Portuguese, Severity::LowSpend) => {
            format!("BAIXO GASTO: {:.1}% utilizado", ratio_pct)
        }
    }
}

/// Classifies one record against an already-resolved budget target.
///
/// Returns `None` when the target is not positive, the spend is unavailable, or
/// the ratio falls inside the normal band.
pub fn classify(
    record: &CampaignRecord,
    target_budget: f64,
    profile: &ThresholdProfile,
) -> Option<Alert> {
    classify_with_language(record, target_budget, profile, MessageLanguage::default())
}

fn classify_with_language(
    record: &CampaignRecord,
    target_budget: f64,
    profile: &ThresholdProfile,
    language: MessageLanguage,
) -> Option<Alert> {
    if !target_budget.is_finite() || target_budget <= 0.0 {
        return None;
    }
    let actual_spend = record.actual_spend.value()?;

    let ratio_pct = 100.0 * actual_spend / target_budget;
    let severity = profile.severity_for(ratio_pct, actual_spend)?;

    Some(Alert {
        severity,
        platform: record.platform.clone(),
        campaign: record.campaign.clone(),
        planned_budget: target_budget,
        actual_spend,
        spend_ratio_pct: ratio_pct,
        message: alert_message(severity, ratio_pct, language),
    })
}

/// Why a record never reached the threshold check.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    InactiveStatus,
    MissingSpend,
    UnparseableSpend,
    MissingPlannedBudget,
    UnparseablePlannedBudget,
    ZeroOrMissingBudget,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Alert(Alert),
    WithinBudget,
    Excluded(ExclusionReason),
}

impl Evaluation {
    pub fn alert(&self) -> Option<&Alert> {
        match self {
            Evaluation::Alert(alert) => Some(alert),
            _ => None,
        }
    }

    pub fn into_alert(self) -> Option<Alert> {
        match self {
            Evaluation::Alert(alert) => Some(alert),
            _ => None,
        }
    }
}

/// A threshold profile plus the rules for which records may be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    profile: ThresholdProfile,
    language: MessageLanguage,
    require_planned_budget: bool,
}

impl Classifier {
    pub fn new(profile: ThresholdProfile) -> Self {
        Self {
            profile,
            language: MessageLanguage::default(),
            require_planned_budget: false,
        }
    }

    pub fn with_language(mut self, language: MessageLanguage) -> Self {
        self.language = language;
        self
    }

    /// When set, a record with no report budget is excluded even though the
    /// target itself comes from the overrides. An unparseable report budget is
    /// always excluded.
    pub fn requiring_planned_budget(mut self, required: bool) -> Self {
        self.require_planned_budget = required;
        self
    }

    pub fn profile(&self) -> &ThresholdProfile {
        &self.profile
    }

    pub fn classify(&self, record: &CampaignRecord, target_budget: f64) -> Option<Alert> {
        classify_with_language(record, target_budget, &self.profile, self.language)
    }

    pub fn evaluate(&self, record: &CampaignRecord, overrides: &BudgetOverrides) -> Evaluation {
        if let Some(reason) = self.exclusion_reason(record) {
            debug!(
                "Row {} ({} / {}) excluded: {:?}",
                record.row_index, record.platform, record.campaign, reason
            );
            return Evaluation::Excluded(reason);
        }

        let target = overrides.resolve_budget(record);
        if !target.is_finite() || target <= 0.0 {
            debug!(
                "Row {} ({} / {}) skipped: budget target {} is not positive",
                record.row_index, record.platform, record.campaign, target
            );
            return Evaluation::Excluded(ExclusionReason::ZeroOrMissingBudget);
        }

        match self.classify(record, target) {
            Some(alert) => Evaluation::Alert(alert),
            None => Evaluation::WithinBudget,
        }
    }

    /// Alerts for every evaluable record, in record order.
    pub fn classify_all(&self, records: &[CampaignRecord], overrides: &BudgetOverrides) -> Vec<Alert> {
        records
            .iter()
            .filter_map(|r| self.evaluate(r, overrides).into_alert())
            .collect()
    }

    fn exclusion_reason(&self, record: &CampaignRecord) -> Option<ExclusionReason> {
        if record.status.as_deref().is_some_and(is_inactive_status) {
            return Some(ExclusionReason::InactiveStatus);
        }

        match record.actual_spend {
            NumericValue::Missing => return Some(ExclusionReason::MissingSpend),
            NumericValue::Unparseable(_) => return Some(ExclusionReason::UnparseableSpend),
            NumericValue::Value(_) => {}
        }

        match record.planned_budget {
            NumericValue::Unparseable(_) => return Some(ExclusionReason::UnparseablePlannedBudget),
            NumericValue::Missing if self.require_planned_budget => {
                return Some(ExclusionReason::MissingPlannedBudget)
            }
            _ => {}
        }

        None
    }
}
