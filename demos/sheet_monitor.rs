use campaign_budget_monitor::*;
use chrono::Utc;
use std::collections::BTreeMap;

fn main() -> Result<()> {
    let sheet = read_csv_str(
        "Platform,Campaign,Spend,Status\n\
         Google Ads,Search - Brand,1240.00,Active\n\
         Google Ads,Shopping,410.00,Active\n\
         Meta Ads,Retargeting,2380.00,Active\n\
         Meta Ads,Lookalike,2100.00,Paused\n\
         TikTok Ads,Launch Teaser,180.00,Active\n\
         LinkedIn Ads,B2B Leads,,Active\n",
    )?;

    let mapping = FieldMapping::explicit(
        &sheet,
        [
            (CanonicalField::Campaign, "Campaign"),
            (CanonicalField::ActualSpend, "Spend"),
            (CanonicalField::Status, "Status"),
        ],
    )?;

    let overrides = BudgetOverrides::with_global(1000.0)
        .platform(META_ADS, 2500.0)
        .campaign("Shopping", 500.0);

    let monitor = BudgetMonitor::new(MonitorConfig::single_sheet(overrides.clone()))?;
    let report = monitor.analyze_sheet(
        &sheet,
        &mapping,
        &PlatformSource::Column("Platform".to_string()),
    );

    println!(
        "Campaigns: {} | Alerts: {} | Critical: {} | Platforms: {}",
        report.metrics.total_records,
        report.metrics.total_alerts,
        report.metrics.critical_alerts,
        report.metrics.platforms
    );
    for alert in &report.alerts {
        println!(
            "  [{}] {} - {}: {}",
            alert.severity, alert.platform, alert.campaign, alert.message
        );
    }

    println!("\n{}", monitor.digest(&report).body);

    let mut exports = BTreeMap::new();
    exports.insert(
        GOOGLE_ADS.to_string(),
        read_csv_str("Campaign,Budget,Cost\nSearch - Brand,1000,970\nShopping,500,90\n")?,
    );
    exports.insert(
        TIKTOK_ADS.to_string(),
        read_csv_str("Custo,Campanha\n10,Teaser\n")?,
    );

    let platform_report = process_platforms(&MonitorConfig::multi_platform(overrides), &exports)?;
    println!(
        "Multi-platform run: {} alerts, skipped: {:?}",
        platform_report.alerts.len(),
        platform_report
            .skipped_platforms
            .iter()
            .map(|s| s.platform.as_str())
            .collect::<Vec<_>>()
    );

    let payload = build_digest(&platform_report.alerts, &platform_report.summary, Utc::now());
    if let DeliveryOutcome::Failed(reason) = dispatch(&LogNotifier, &payload) {
        eprintln!("Delivery failed: {}", reason);
    }

    Ok(())
}
