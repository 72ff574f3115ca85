use crate::classifier::{MessageLanguage, ProfileKind, ThresholdProfile};
use crate::error::Result;
use crate::notifier::EmailSettings;
use crate::overrides::BudgetOverrides;
use crate::synonyms::{default_synonym_table, SynonymTable};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything a caller hands the engine for one run.
///
/// Nothing here is cached between runs; build a new value (or clone and edit
/// one) whenever the user changes a setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonitorConfig {
    #[serde(default)]
    pub overrides: BudgetOverrides,

    #[schemars(description = "Built-in threshold profile. Ignored when custom_profile is set.")]
    #[serde(default)]
    pub profile: ProfileKind,

    #[serde(default)]
    pub custom_profile: Option<ThresholdProfile>,

    #[schemars(
        description = "Column synonyms per platform for multi-platform mode. Defaults to the built-in table."
    )]
    #[serde(default)]
    pub synonyms: Option<SynonymTable>,

    #[serde(default)]
    pub language: MessageLanguage,

    #[serde(default)]
    pub email: Option<EmailSettings>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            overrides: BudgetOverrides::default(),
            profile: ProfileKind::default(),
            custom_profile: None,
            synonyms: None,
            language: MessageLanguage::default(),
            email: None,
        }
    }
}

impl MonitorConfig {
    pub fn single_sheet(overrides: BudgetOverrides) -> Self {
        Self {
            overrides,
            profile: ProfileKind::SingleSheet,
            ..Default::default()
        }
    }

    pub fn multi_platform(overrides: BudgetOverrides) -> Self {
        Self {
            overrides,
            profile: ProfileKind::MultiPlatform,
            ..Default::default()
        }
    }

    pub fn threshold_profile(&self) -> ThresholdProfile {
        self.custom_profile
            .clone()
            .unwrap_or_else(|| self.profile.profile())
    }

    pub fn synonym_table(&self) -> SynonymTable {
        self.synonyms.clone().unwrap_or_else(default_synonym_table)
    }

    /// Structural checks on caller-supplied settings.
    pub fn validate(&self) -> Result<()> {
        self.overrides.validate()?;
        if let Some(profile) = &self.custom_profile {
            profile.validate()?;
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(MonitorConfig)
    }
}
