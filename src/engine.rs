use crate::aggregator::{aggregate, AlertSummary, RunMetrics};
use crate::classifier::{Classifier, Evaluation};
use crate::config::MonitorConfig;
use crate::error::Result;
use crate::normalizer::{normalize, PlatformSource};
use crate::notifier::{build_digest, dispatch, DeliveryOutcome, NotificationPayload, Notifier};
use crate::schema::{Alert, CampaignRecord, CanonicalField, FieldMapping, RawDataset};
use crate::synonyms::resolve_schema;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPlatform {
    pub platform: String,
    pub reason: String,
}

/// Everything a display or notification collaborator needs from one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Every normalized record, evaluable or not.
    pub records: Vec<CampaignRecord>,
    /// Alerts in input order: platform key order, then row order.
    pub alerts: Vec<Alert>,
    pub summary: AlertSummary,
    pub metrics: RunMetrics,
    pub skipped_platforms: Vec<SkippedPlatform>,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct BudgetMonitor {
    config: MonitorConfig,
}

impl BudgetMonitor {
    pub fn new(config: MonitorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Single-spreadsheet mode: the caller picked the columns, so no synonym
    /// lookup happens. The budget target comes from the overrides; a budget
    /// column, when mapped, must hold a number for the row to be evaluated.
    pub fn analyze_sheet(
        &self,
        dataset: &RawDataset,
        mapping: &FieldMapping,
        platform: &PlatformSource,
    ) -> AnalysisReport {
        info!(
            "Analyzing spreadsheet with {} rows using profile '{}'",
            dataset.len(),
            self.config.threshold_profile().name
        );

        let records = normalize(dataset, mapping, platform);
        let classifier =
            self.classifier(mapping.is_bound(CanonicalField::PlannedBudget));

        self.build_report(records, &classifier, Vec::new())
    }

    /// Multi-platform mode: one report per platform, columns resolved through the
    /// synonym table. Platforms whose columns cannot be resolved are skipped.
    pub fn analyze_platforms(&self, reports: &BTreeMap<String, RawDataset>) -> AnalysisReport {
        info!(
            "Analyzing {} platform reports using profile '{}'",
            reports.len(),
            self.config.threshold_profile().name
        );

        let synonyms = self.config.synonym_table();
        let mut records = Vec::new();
        let mut skipped = Vec::new();

        for (platform, dataset) in reports {
            match resolve_schema(&dataset.column_set(), platform, &synonyms) {
                Ok(mapping) => {
                    debug!("{}: resolved {} fields", platform, mapping.len());
                    records.extend(normalize(
                        dataset,
                        &mapping,
                        &PlatformSource::Fixed(platform.clone()),
                    ));
                }
                Err(e) => {
                    warn!("Skipping {} report: {}", platform, e);
                    skipped.push(SkippedPlatform {
                        platform: platform.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let classifier = self.classifier(true);
        self.build_report(records, &classifier, skipped)
    }

    pub fn digest(&self, report: &AnalysisReport) -> NotificationPayload {
        build_digest(&report.alerts, &report.summary, report.generated_at)
    }

    pub fn notify(&self, report: &AnalysisReport, notifier: &dyn Notifier) -> DeliveryOutcome {
        dispatch(notifier, &self.digest(report))
    }

    fn classifier(&self, require_planned_budget: bool) -> Classifier {
        Classifier::new(self.config.threshold_profile())
            .with_language(self.config.language)
            .requiring_planned_budget(require_planned_budget)
    }

    fn build_report(
        &self,
        records: Vec<CampaignRecord>,
        classifier: &Classifier,
        skipped_platforms: Vec<SkippedPlatform>,
    ) -> AnalysisReport {
        let evaluations: Vec<Evaluation> = records
            .iter()
            .map(|r| classifier.evaluate(r, &self.config.overrides))
            .collect();

        let metrics = RunMetrics::from_evaluations(&records, &evaluations);
        let alerts: Vec<Alert> = evaluations
            .into_iter()
            .filter_map(Evaluation::into_alert)
            .collect();
        let summary = aggregate(&alerts);

        info!(
            "Evaluated {}/{} records: {} alerts ({} critical), {} excluded",
            metrics.evaluated_records,
            metrics.total_records,
            metrics.total_alerts,
            metrics.critical_alerts,
            metrics.excluded_total()
        );

        AnalysisReport {
            records,
            alerts,
            summary,
            metrics,
            skipped_platforms,
            generated_at: Utc::now(),
        }
    }
}

pub fn process_sheet(
    config: &MonitorConfig,
    dataset: &RawDataset,
    mapping: &FieldMapping,
    platform: &PlatformSource,
) -> Result<AnalysisReport> {
    let monitor = BudgetMonitor::new(config.clone())?;
    Ok(monitor.analyze_sheet(dataset, mapping, platform))
}

pub fn process_platforms(
    config: &MonitorConfig,
    reports: &BTreeMap<String, RawDataset>,
) -> Result<AnalysisReport> {
    let monitor = BudgetMonitor::new(config.clone())?;
    Ok(monitor.analyze_platforms(reports))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ExclusionReason;
    use crate::ingestion::read_csv_str;
    use crate::overrides::BudgetOverrides;
    use crate::schema::Severity;
    use crate::synonyms::{GOOGLE_ADS, META_ADS};

    #[test]
    fn test_sheet_mode_end_to_end() {
        let dataset = read_csv_str(
            "Platform,Campaign,Spend,Status\n\
             Google Ads,Brand,1200,Active\n\
             Google Ads,Generic,1000,Active\n\
             Meta Ads,Prospecting,200,Active\n\
             Meta Ads,Old,5000,Paused\n\
             Meta Ads,Broken,abc,Active\n",
        )
        .unwrap();

        let mapping = FieldMapping::explicit(
            &dataset,
            [
                (CanonicalField::Campaign, "Campaign"),
                (CanonicalField::ActualSpend, "Spend"),
                (CanonicalField::Status, "Status"),
            ],
        )
        .unwrap();

        let monitor =
            BudgetMonitor::new(MonitorConfig::single_sheet(BudgetOverrides::with_global(1000.0)))
                .unwrap();
        let report =
            monitor.analyze_sheet(&dataset, &mapping, &PlatformSource::Column("Platform".into()));

        let severities: Vec<Severity> = report.alerts.iter().map(|a| a.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::Critical, Severity::OverBudget, Severity::LowSpend]
        );
        assert_eq!(report.records.len(), 5);
        assert_eq!(report.metrics.total_records, 5);
        assert_eq!(report.metrics.excluded_total(), 2);
        assert_eq!(report.metrics.platforms, 2);
        assert_eq!(report.summary.total, report.alerts.len());
    }

    #[test]
    fn test_platform_mode_skips_unresolved_and_orders_by_platform() {
        let mut reports = BTreeMap::new();
        reports.insert(
            META_ADS.to_string(),
            read_csv_str("Campaign name,Campaign budget,Amount spent\nRetargeting,1000,1200\n")
                .unwrap(),
        );
        reports.insert(
            GOOGLE_ADS.to_string(),
            read_csv_str("Campaign,Budget,Cost\nSearch,1000,980\n").unwrap(),
        );
        reports.insert(
            "TikTok Ads".to_string(),
            read_csv_str("Custo,Campanha\n10,X\n").unwrap(),
        );

        let config = MonitorConfig::multi_platform(BudgetOverrides::with_global(1000.0));
        let report = process_platforms(&config, &reports).unwrap();

        let platforms: Vec<&str> = report.alerts.iter().map(|a| a.platform.as_str()).collect();
        assert_eq!(platforms, vec![GOOGLE_ADS, META_ADS]);
        assert_eq!(report.alerts[0].severity, Severity::NearLimit);
        assert_eq!(report.alerts[1].severity, Severity::Critical);

        assert_eq!(report.skipped_platforms.len(), 1);
        assert_eq!(report.skipped_platforms[0].platform, "TikTok Ads");
    }

    #[test]
    fn test_sheet_mode_excludes_bad_budget_cells_when_budget_is_mapped() {
        let dataset = read_csv_str(
            "Platform,Campaign,Budget,Spend\n\
             Google Ads,Brand,abc,1200\n\
             Google Ads,NoBudget,,1200\n\
             Google Ads,Generic,5000,1200\n",
        )
        .unwrap();
        let platform = PlatformSource::Column("Platform".into());
        let monitor =
            BudgetMonitor::new(MonitorConfig::single_sheet(BudgetOverrides::with_global(1000.0)))
                .unwrap();

        let with_budget = FieldMapping::explicit(
            &dataset,
            [
                (CanonicalField::Campaign, "Campaign"),
                (CanonicalField::PlannedBudget, "Budget"),
                (CanonicalField::ActualSpend, "Spend"),
            ],
        )
        .unwrap();
        let report = monitor.analyze_sheet(&dataset, &with_budget, &platform);

        let campaigns: Vec<&str> = report.alerts.iter().map(|a| a.campaign.as_str()).collect();
        assert_eq!(campaigns, vec!["Generic"]);
        assert_eq!(report.alerts[0].planned_budget, 1000.0);
        assert_eq!(
            report.metrics.excluded[&ExclusionReason::UnparseablePlannedBudget],
            1
        );
        assert_eq!(report.metrics.excluded[&ExclusionReason::MissingPlannedBudget], 1);

        let without_budget = FieldMapping::explicit(
            &dataset,
            [
                (CanonicalField::Campaign, "Campaign"),
                (CanonicalField::ActualSpend, "Spend"),
            ],
        )
        .unwrap();
        let report = monitor.analyze_sheet(&dataset, &without_budget, &platform);
        assert_eq!(report.alerts.len(), 3);
        assert_eq!(report.metrics.excluded_total(), 0);
    }

    #[test]
    fn test_invalid_config_is_rejected_up_front() {
        let config = MonitorConfig::single_sheet(BudgetOverrides::with_global(-1.0));
        assert!(BudgetMonitor::new(config).is_err());
    }
}
