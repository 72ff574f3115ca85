//! # Campaign Budget Monitor
//!
//! A library for reconciling advertising-spend reports against planned budgets
//! and classifying each campaign into an alert tier.
//!
//! ## Core Concepts
//!
//! - **Schema-on-read**: Reports arrive with whatever column names the platform uses.
//!   A synonym table maps them onto four canonical fields (campaign, planned budget,
//!   actual spend, status).
//! - **Override precedence**: The budget target for a campaign is its own override,
//!   else its platform's, else the global default.
//! - **Threshold profiles**: Spend ratio (spend / target, in percent) is bucketed into
//!   CRITICAL, OVER_BUDGET, NEAR_LIMIT or LOW_SPEND by a caller-selected profile.
//! - **No hidden state**: Every run takes its dataset and configuration as arguments
//!   and returns an immutable report.
//!
//! ## Example
//!
//! ```rust,ignore
//! use campaign_budget_monitor::*;
//!
//! let dataset = read_csv_str("Platform,Campaign,Spend\nGoogle Ads,Brand,1200\n")?;
//! let mapping = FieldMapping::explicit(
//!     &dataset,
//!     [
//!         (CanonicalField::Campaign, "Campaign"),
//!         (CanonicalField::ActualSpend, "Spend"),
//!     ],
//! )?;
//!
//! let overrides = BudgetOverrides::with_global(1000.0).platform("Meta Ads", 2500.0);
//! let monitor = BudgetMonitor::new(MonitorConfig::single_sheet(overrides))?;
//! let report = monitor.analyze_sheet(
//!     &dataset,
//!     &mapping,
//!     &PlatformSource::Column("Platform".to_string()),
//! );
//!
//! assert_eq!(report.alerts[0].severity, Severity::Critical);
//! ```

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod normalizer;
pub mod notifier;
pub mod overrides;
pub mod schema;
pub mod synonyms;

pub use aggregator::{aggregate, alerts_with_severity, AlertSummary, RunMetrics};
pub use classifier::{
    alert_message, classify, Classifier, Evaluation, ExclusionReason, LowSpendRule,
    MessageLanguage, ProfileKind, ThresholdProfile, ThresholdTier,
};
pub use config::MonitorConfig;
pub use engine::{
    process_platforms, process_sheet, AnalysisReport, BudgetMonitor, SkippedPlatform,
};
pub use error::{BudgetMonitorError, Result};
pub use ingestion::{detect_delimiter, read_csv, read_csv_path, read_csv_str};
pub use normalizer::{coerce_numeric, is_inactive_status, normalize, PlatformSource};
pub use notifier::{
    build_digest, dispatch, DeliveryOutcome, EmailSettings, LogNotifier, NotificationPayload,
    Notifier,
};
pub use overrides::{resolve_budget, BudgetOverrides};
pub use schema::*;
pub use synonyms::{
    default_synonym_table, resolve_schema, FieldSynonyms, SynonymTable, GOOGLE_ADS, LINKEDIN_ADS,
    META_ADS, TIKTOK_ADS,
};
