use crate::classifier::{Evaluation, ExclusionReason};
use crate::schema::{Alert, CampaignRecord, Severity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSummary {
    /// Every severity is present, zero counts included.
    pub by_severity: BTreeMap<Severity, usize>,
    pub total: usize,
    /// Alerts per platform, in input order.
    pub by_platform: BTreeMap<String, Vec<Alert>>,
}

impl AlertSummary {
    pub fn count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }
}

/// Groups alerts by severity and platform. No alert is merged or dropped.
pub fn aggregate(alerts: &[Alert]) -> AlertSummary {
    let mut by_severity: BTreeMap<Severity, usize> =
        Severity::ALL.iter().map(|s| (*s, 0)).collect();
    let mut by_platform: BTreeMap<String, Vec<Alert>> = BTreeMap::new();

    for alert in alerts {
        *by_severity.entry(alert.severity).or_default() += 1;
        by_platform
            .entry(alert.platform.clone())
            .or_default()
            .push(alert.clone());
    }

    AlertSummary {
        by_severity,
        total: alerts.len(),
        by_platform,
    }
}

/// Alerts of one severity, in input order.
pub fn alerts_with_severity(alerts: &[Alert], severity: Severity) -> Vec<&Alert> {
    alerts.iter().filter(|a| a.severity == severity).collect()
}

/// Headline numbers for a run, counted over the raw dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub total_records: usize,
    pub evaluated_records: usize,
    pub total_alerts: usize,
    pub critical_alerts: usize,
    pub platforms: usize,
    pub excluded: BTreeMap<ExclusionReason, usize>,
}

impl RunMetrics {
    pub fn from_evaluations(records: &[CampaignRecord], evaluations: &[Evaluation]) -> Self {
        let platforms: BTreeSet<&str> = records.iter().map(|r| r.platform.as_str()).collect();

        let mut metrics = RunMetrics {
            total_records: records.len(),
            platforms: platforms.len(),
            ..Default::default()
        };

        for evaluation in evaluations {
            match evaluation {
                Evaluation::Alert(alert) => {
                    metrics.evaluated_records += 1;
                    metrics.total_alerts += 1;
                    if alert.severity == Severity::Critical {
                        metrics.critical_alerts += 1;
                    }
                }
                Evaluation::WithinBudget => metrics.evaluated_records += 1,
                Evaluation::Excluded(reason) => {
                    *metrics.excluded.entry(*reason).or_default() += 1;
                }
            }
        }

        metrics
    }

    pub fn excluded_total(&self) -> usize {
        self.excluded.values().sum()
    }
}
