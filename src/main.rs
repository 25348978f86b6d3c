//! Flarewatch
//!
//! Offline analysis of the local record store: prints the trigger report
//! and the flare-up prediction without starting the server.

use anyhow::Context;
use clap::Parser;
use flarewatch::analysis::{AnalysisEngine, AnalysisError, FlareupOutcome, TriggerCounts};
use flarewatch::config::Config;
use flarewatch::storage::{format_date, RecordStore, SqliteStore};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flarewatch")]
#[command(about = "Analyze the local Flarewatch record store")]
#[command(version)]
struct Args {
    /// Config file (defaults to the standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file (overrides the config)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    config
        .logging
        .init("flarewatch=warn")
        .context("initializing logging")?;

    let db_path = args.db.unwrap_or_else(|| config.storage.database_path());
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("opening record store at {}", db_path.display()))?;

    let records = store.fetch_all().await?;
    tracing::info!(records = records.len(), "Loaded records");

    let engine = AnalysisEngine::new(config.analysis.clone());

    let analysis = match engine.analyze(&records) {
        Ok(analysis) => analysis,
        Err(e @ (AnalysisError::NoData | AnalysisError::InsufficientSeries { .. })) => {
            println!("{}", e);
            return Ok(());
        }
    };
    let report = analysis.report();
    let outcome = engine.predict_from(&analysis, &records);

    if args.json {
        let json = serde_json::json!({
            "triggers": report,
            "flareup": outcome,
            "message": outcome.message(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("Symptom severity");
    println!("  mean:      {:.2}", report.mean);
    println!("  std dev:   {:.2}", report.std_dev);
    println!("  threshold: {:.2}", report.threshold);
    println!();

    println!("Spike days ({})", report.spike_days.len());
    for (date, severity) in &report.spike_days {
        println!("  {}  {:.2}", format_date(*date), severity);
    }
    println!();

    println!("Triggers (day before a spike)");
    println!(
        "  low sleep (< {}h): {}",
        config.analysis.low_sleep_hours, report.triggers.low_sleep.count
    );
    print_counts("food", &report.triggers.food_items);
    print_counts("period event", &report.triggers.menstrual_events);
    print_counts("flow", &report.triggers.flow_levels);
    println!();

    println!("Flare-up: {}", outcome.message());
    match &outcome {
        FlareupOutcome::Predicted(prediction) => {
            println!("  probability: {:.2}%", prediction.flareup_probability);
            for line in &prediction.flareup_predictions {
                println!("  - {}", line);
            }
        }
        FlareupOutcome::NoTriggers {
            flareup_predictions,
        } => {
            for line in flareup_predictions {
                println!("  - {}", line);
            }
        }
        FlareupOutcome::NoPredictions => {}
    }

    Ok(())
}

fn print_counts(label: &str, counts: &TriggerCounts) {
    for (value, count) in counts.ranked() {
        println!("  {} {}: {}", label, value, count);
    }
}
