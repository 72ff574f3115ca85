use crate::error::{BudgetMonitorError, Result};
use crate::schema::CampaignRecord;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Budget targets supplied by the caller.
///
/// The engine reads these but never modifies them; every run works from the
/// snapshot it was handed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BudgetOverrides {
    #[schemars(description = "Budget applied to every campaign without a more specific override")]
    pub global_default: f64,

    #[schemars(description = "Budget per platform name. Beats the global default.")]
    #[serde(default)]
    pub by_platform: BTreeMap<String, f64>,

    #[schemars(description = "Budget per campaign name. Beats both platform and global values.")]
    #[serde(default)]
    pub by_campaign: BTreeMap<String, f64>,
}

impl Default for BudgetOverrides {
    fn default() -> Self {
        Self::with_global(1000.0)
    }
}

impl BudgetOverrides {
    pub fn with_global(global_default: f64) -> Self {
        Self {
            global_default,
            by_platform: BTreeMap::new(),
            by_campaign: BTreeMap::new(),
        }
    }

    pub fn platform(mut self, platform: impl Into<String>, budget: f64) -> Self {
        self.by_platform.insert(platform.into(), budget);
        self
    }

    pub fn campaign(mut self, campaign: impl Into<String>, budget: f64) -> Self {
        self.by_campaign.insert(campaign.into(), budget);
        self
    }

    /// Per-campaign, then per-platform, then the global default.
    pub fn resolve_budget(&self, record: &CampaignRecord) -> f64 {
        if let Some(budget) = self.by_campaign.get(&record.campaign) {
            return *budget;
        }
        if let Some(budget) = self.by_platform.get(&record.platform) {
            return *budget;
        }
        self.global_default
    }

    /// Rejects negative or non-finite targets anywhere in the overrides.
    pub fn validate(&self) -> Result<()> {
        check_budget("global default", self.global_default)?;

        for (platform, budget) in &self.by_platform {
            check_budget(&format!("platform '{}'", platform), *budget)?;
        }

        for (campaign, budget) in &self.by_campaign {
            check_budget(&format!("campaign '{}'", campaign), *budget)?;
        }

        Ok(())
    }
}

fn check_budget(scope: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(BudgetMonitorError::InvalidOverride {
            scope: scope.to_string(),
            value,
        });
    }
    Ok(())
}

pub fn resolve_budget(record: &CampaignRecord, overrides: &BudgetOverrides) -> f64 {
    overrides.resolve_budget(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NumericValue;

    fn record(platform: &str, campaign: &str) -> CampaignRecord {
        CampaignRecord {
            row_index: 0,
            platform: platform.to_string(),
            campaign: campaign.to_string(),
            planned_budget: NumericValue::Missing,
            actual_spend: NumericValue::Value(100.0),
            status: None,
        }
    }

    #[test]
    fn test_override_precedence() {
        let overrides = BudgetOverrides::with_global(1000.0)
            .platform("Meta Ads", 2000.0)
            .campaign("Black Friday", 5000.0);

        assert_eq!(overrides.resolve_budget(&record("Google Ads", "Search")), 1000.0);
        assert_eq!(overrides.resolve_budget(&record("Meta Ads", "Search")), 2000.0);
        assert_eq!(overrides.resolve_budget(&record("Meta Ads", "Black Friday")), 5000.0);
        assert_eq!(resolve_budget(&record("Google Ads", "Black Friday"), &overrides), 5000.0);
    }

    #[test]
    fn test_campaign_override_dominates_even_when_zero() {
        let overrides = BudgetOverrides::with_global(1000.0)
            .platform("Meta Ads", 2000.0)
            .campaign("Paused Test", 0.0);

        let budget = overrides.resolve_budget(&record("Meta Ads", "Paused Test"));
        assert_eq!(budget, 0.0);
    }

    #[test]
    fn test_campaign_override_never_yields_platform_or_global() {
        let platforms = ["Google Ads", "Meta Ads", "TikTok Ads", "LinkedIn Ads", "Other"];
        let overrides = BudgetOverrides::with_global(10.0)
            .platform("Google Ads", 20.0)
            .platform("Meta Ads", 30.0)
            .campaign("Launch", 40.0);

        for platform in platforms {
            assert_eq!(overrides.resolve_budget(&record(platform, "Launch")), 40.0);
        }
    }

    #[test]
    fn test_validate_rejects_negative_values() {
        assert!(BudgetOverrides::with_global(0.0).validate().is_ok());
        assert!(BudgetOverrides::with_global(-1.0).validate().is_err());

        let err = BudgetOverrides::with_global(100.0)
            .campaign("Broken", f64::NAN)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("campaign 'Broken'"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let overrides: BudgetOverrides =
            serde_json::from_str(r#"{ "global_default": 750.0 }"#).unwrap();
        assert_eq!(overrides.global_default, 750.0);
        assert!(overrides.by_platform.is_empty());
        assert!(overrides.by_campaign.is_empty());
    }
}
