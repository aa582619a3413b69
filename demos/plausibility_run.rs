//! Plausibility run over the sample clearing day

use margin_plausibility::utils::{MemoryMarginSource, RecordingNotifier};
use margin_plausibility::{MarginSource, PlausibilityMonitor, ReconcilerConfig, TracingCheckLogger};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "margin_plausibility=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("🔎 Margin Plausibility - Sample Run\n");

    let config = ReconcilerConfig::from_env()?;
    println!(
        "  first snapshot: {}  last snapshot: {}  policy: {:?}\n",
        config.first_snapshot, config.last_snapshot, config.match_policy
    );

    // 1. A consistent clearing day
    let source = MemoryMarginSource::with_sample_data();
    let notifier = RecordingNotifier::new();
    let monitor = PlausibilityMonitor::with_config(
        source.clone(),
        notifier.clone(),
        TracingCheckLogger,
        config.clone(),
    );

    let report = monitor.run().await?;
    for outcome in report.outcomes() {
        println!("  ✓ {}", outcome);
    }
    println!();

    // 2. The first snapshot of 2020-05-12 disagrees with the closing value
    println!("⚠️  Injecting a deviating intraday value...\n");
    let mut intraday = source.fetch_intraday().await?;
    if let Some(row) = intraday
        .iter_mut()
        .find(|r| r.date == "2020-05-12" && r.time == "08:00:00")
    {
        row.margin += 0.1;
    }
    let deviating = MemoryMarginSource::with_rows(source.fetch_end_of_day().await?, intraday);
    let monitor = PlausibilityMonitor::with_config(
        deviating,
        notifier.clone(),
        TracingCheckLogger,
        config,
    );

    let report = monitor.run().await?;
    for outcome in report.outcomes() {
        let marker = if outcome.matched { "✓" } else { "✗" };
        println!("  {} {}", marker, outcome);
        for record in &outcome.unmatched_eod {
            println!(
                "      end-of-day {} {} {} {} {}",
                record.date,
                record.clearing_number,
                record.account,
                record.margin_type,
                record.margin
            );
        }
        for record in &outcome.unmatched_intraday {
            println!(
                "      intraday   {} {} {} {} {} {}",
                record.date,
                record.time,
                record.clearing_number,
                record.account,
                record.margin_type,
                record.margin
            );
        }
    }

    println!("\n📨 Notifications:");
    for sent in notifier.sent() {
        println!("  • {} ({} records)", sent.label, sent.records.len());
    }

    Ok(())
}
