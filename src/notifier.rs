//! Hand-off to whoever delivers alerts (email, chat, dashboards).
//!
//! The engine only builds a [`NotificationPayload`]; delivery, and any failure of
//! it, belongs to the [`Notifier`] implementation.

use crate::aggregator::{alerts_with_severity, AlertSummary};
use crate::error::Result;
use crate::schema::{Alert, Severity};
use chrono::{DateTime, Utc};
use log::{info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Per-session mail settings, passed in by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EmailSettings {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender: String,
    pub recipients: Vec<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub subject: String,
    pub body: String,
    pub alert_count: usize,
    pub generated_at: DateTime<Utc>,
}

pub trait Notifier {
    fn notify(&self, payload: &NotificationPayload) -> Result<()>;
}

/// Writes the digest to the log instead of sending it anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, payload: &NotificationPayload) -> Result<()> {
        info!("{}\n{}", payload.subject, payload.body);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
}

/// Delivers a payload. A failure is logged and reported, never propagated, so
/// the alerts already computed stay valid.
pub fn dispatch(notifier: &dyn Notifier, payload: &NotificationPayload) -> DeliveryOutcome {
    match notifier.notify(payload) {
        Ok(()) => {
            info!("Delivered budget digest with {} alerts", payload.alert_count);
            DeliveryOutcome::Delivered
        }
        Err(e) => {
            warn!("Budget digest delivery failed: {}", e);
            DeliveryOutcome::Failed(e.to_string())
        }
    }
}

/// Plain-text digest, grouped by severity in urgency order.
pub fn build_digest(
    alerts: &[Alert],
    summary: &AlertSummary,
    generated_at: DateTime<Utc>,
) -> NotificationPayload {
    let critical = summary.count(Severity::Critical);
    let subject = format!(
        "Campaign budget alerts {}: {} alerts ({} critical)",
        generated_at.format("%Y-%m-%d"),
        summary.total,
        critical
    );

    let mut body = String::new();
    if alerts.is_empty() {
        body.push_str("All campaigns are within budget. No discrepancies were found.\n");
    } else {
        body.push_str(&format!("{} campaigns need attention.\n", summary.total));

        for severity in Severity::ALL {
            let group = alerts_with_severity(alerts, severity);
            if group.is_empty() {
                continue;
            }

            body.push_str(&format!("\n{} ({})\n", severity, group.len()));
            for alert in group {
                body.push_str(&format!(
                    "- {} - {}: budget {:.2} | spend {:.2} | {:.1}%\n  {}\n",
                    alert.platform,
                    alert.campaign,
                    alert.planned_budget,
                    alert.actual_spend,
                    alert.spend_ratio_pct,
                    alert.message
                ));
            }
        }
    }

    body.push_str(&format!(
        "\nGenerated at {}\n",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    NotificationPayload {
        subject,
        body,
        alert_count: alerts.len(),
        generated_at,
    }
}
