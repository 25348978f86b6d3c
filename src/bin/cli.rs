//! Flarewatch CLI
//!
//! Command-line client for a running Flarewatch API server:
//! - Log sleep, meals, cycle entries and symptoms
//! - Show trigger analysis, flare-up prediction and recommendations
//! - Import records from CSV
//! - Check status

use anyhow::{bail, Context};
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use flarewatch::api::dto::{DietRequest, MenstrualRequest, SleepRequest, SymptomRequest};
use flarewatch::integrations::CsvImporter;
use flarewatch::storage::{format_date, parse_record_date, RecordKind};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flarewatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Track symptoms and find what triggers flare-ups")]
#[command(long_about = "Flarewatch keeps a daily log of sleep, diet, menstrual cycle and symptoms.\nIt finds what tends to precede symptom spikes and scores flare-up risk.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8080", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log a night of sleep
    Sleep {
        /// Hours slept
        hours: f64,
        /// Day to log against: "today", "yesterday", YYYY-MM-DD or RFC 3339
        #[arg(short, long, default_value = "today")]
        date: String,
        /// Self-rated quality
        #[arg(short, long, default_value = "0")]
        quality: i32,
        /// What disturbed the night
        #[arg(long, default_value = "")]
        disruptions: String,
        #[arg(short, long, default_value = "")]
        notes: String,
    },

    /// Log a meal
    Diet {
        /// Meal label (breakfast, lunch, dinner, snack)
        meal: String,
        /// Food items eaten
        items: Vec<String>,
        #[arg(short, long, default_value = "today")]
        date: String,
        #[arg(short, long, default_value = "")]
        notes: String,
    },

    /// Log a menstrual cycle entry
    Menstrual {
        /// Period event (start, ongoing, end)
        event: String,
        /// Flow level (light, medium, heavy)
        flow: String,
        #[arg(short, long, default_value = "today")]
        date: String,
        #[arg(short, long, default_value = "")]
        notes: String,
    },

    /// Log symptom ratings (1-10)
    Symptoms {
        nausea: i32,
        fatigue: i32,
        pain: i32,
        #[arg(short, long, default_value = "today")]
        date: String,
        #[arg(short, long, default_value = "")]
        notes: String,
    },

    /// List stored records of one kind
    List {
        /// Record kind (sleep, diet, menstrual, symptoms)
        kind: RecordKind,
    },

    /// Show what preceded symptom spikes
    Triggers,

    /// Show flare-up risk for recent days
    Flareup,

    /// Show three recommendations
    Recommend,

    /// Import records of one kind from CSV
    Import {
        /// Record kind (sleep, diet, menstrual, symptoms)
        kind: RecordKind,
        /// Path to CSV file
        path: PathBuf,
        /// Separator between diet items
        #[arg(long, default_value = ";")]
        item_separator: char,
        /// Dry run (don't actually import)
        #[arg(long)]
        dry_run: bool,
    },

    /// Show system status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = ApiClient {
        http: reqwest::Client::new(),
        base_url: cli.api_url.trim_end_matches('/').to_string(),
    };
    let json_output = cli.format == "json";

    match cli.command {
        Commands::Sleep {
            hours,
            date,
            quality,
            disruptions,
            notes,
        } => {
            let body = SleepRequest {
                date: resolve_date(&date)?,
                duration: hours,
                quality,
                disruptions,
                notes,
            };
            let stored = client.post("/api/v1/sleep", &body).await?;
            println!("Logged {}h of sleep on {}", hours, stored["date"].as_str().unwrap_or("-"));
        }

        Commands::Diet {
            meal,
            items,
            date,
            notes,
        } => {
            let items: Vec<String> = items
                .iter()
                .flat_map(|i| i.split(',').map(|s| s.trim().to_string()))
                .filter(|s| !s.is_empty())
                .collect();
            let body = DietRequest {
                date: resolve_date(&date)?,
                meal,
                items,
                notes,
            };
            let stored = client.post("/api/v1/diet", &body).await?;
            println!(
                "Logged {} on {}: {}",
                stored["meal"].as_str().unwrap_or("-"),
                stored["date"].as_str().unwrap_or("-"),
                join_strings(&stored["items"])
            );
        }

        Commands::Menstrual {
            event,
            flow,
            date,
            notes,
        } => {
            let body = MenstrualRequest {
                date: resolve_date(&date)?,
                period_event: event,
                flow_level: flow,
                notes,
            };
            let stored = client.post("/api/v1/menstrual", &body).await?;
            println!("Logged cycle entry on {}", stored["date"].as_str().unwrap_or("-"));
        }

        Commands::Symptoms {
            nausea,
            fatigue,
            pain,
            date,
            notes,
        } => {
            let body = SymptomRequest {
                date: resolve_date(&date)?,
                nausea,
                fatigue,
                pain,
                notes,
            };
            let stored = client.post("/api/v1/symptoms", &body).await?;
            println!(
                "Logged symptoms on {} (nausea {}, fatigue {}, pain {})",
                stored["date"].as_str().unwrap_or("-"),
                nausea,
                fatigue,
                pain
            );
        }

        Commands::List { kind } => {
            let records = client.get(&format!("/api/v1/{}", kind)).await?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_records(kind, &records);
            }
        }

        Commands::Triggers => {
            let report = client.get("/api/v1/analysis/triggers").await?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_triggers(&report);
            }
        }

        Commands::Flareup => {
            let prediction = client.get("/api/v1/analysis/flareup").await?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&prediction)?);
            } else {
                println!("{}", prediction["message"].as_str().unwrap_or("-"));
                if let Some(probability) = prediction["flareup_probability"].as_f64() {
                    println!("Flare-up probability: {:.2}%", probability);
                }
                if let Some(lines) = prediction["flareup_predictions"].as_array() {
                    for line in lines {
                        println!("  - {}", line.as_str().unwrap_or("-"));
                    }
                }
            }
        }

        Commands::Recommend => {
            let response = client.get("/api/v1/analysis/recommendations").await?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                if let Some(items) = response["recommendations"].as_array() {
                    for (i, item) in items.iter().enumerate() {
                        println!("{}. {}", i + 1, item.as_str().unwrap_or("-"));
                    }
                }
                println!();
                println!("(source: {})", response["source"].as_str().unwrap_or("unknown"));
            }
        }

        Commands::Import {
            kind,
            path,
            item_separator,
            dry_run,
        } => {
            if !path.exists() {
                bail!("File not found: {:?}", path);
            }

            let result = CsvImporter::new(kind)
                .with_item_separator(item_separator)
                .import(&path)?;

            println!("Import results:");
            println!("  Rows processed: {}", result.rows_processed);
            println!("  Rows failed: {}", result.rows_failed);

            if !result.errors.is_empty() {
                println!();
                println!("Errors (first 10):");
                for error in result.errors.iter().take(10) {
                    println!("  {}", error);
                }
            }

            if dry_run {
                println!();
                println!("(Dry run - no data was imported)");
            } else if !result.records.is_empty() {
                println!();
                println!("Importing records...");

                let records = result.records;
                let mut bodies: Vec<(&str, Value)> = Vec::with_capacity(records.len());
                for r in records.sleep {
                    bodies.push((
                        "/api/v1/sleep",
                        serde_json::to_value(SleepRequest {
                            date: format_date(r.date),
                            duration: r.duration_hours,
                            quality: r.quality,
                            disruptions: r.disruptions,
                            notes: r.notes,
                        })?,
                    ));
                }
                for r in records.diet {
                    bodies.push((
                        "/api/v1/diet",
                        serde_json::to_value(DietRequest {
                            date: format_date(r.date),
                            meal: r.meal,
                            items: r.items,
                            notes: r.notes,
                        })?,
                    ));
                }
                for r in records.menstrual {
                    bodies.push((
                        "/api/v1/menstrual",
                        serde_json::to_value(MenstrualRequest {
                            date: format_date(r.date),
                            period_event: r.period_event,
                            flow_level: r.flow_level,
                            notes: r.notes,
                        })?,
                    ));
                }
                for r in records.symptoms {
                    bodies.push((
                        "/api/v1/symptoms",
                        serde_json::to_value(SymptomRequest {
                            date: format_date(r.date),
                            nausea: r.nausea,
                            fatigue: r.fatigue,
                            pain: r.pain,
                            notes: r.notes,
                        })?,
                    ));
                }

                let mut success = 0;
                let mut failed = 0;
                for (path, body) in &bodies {
                    match client.post(path, body).await {
                        Ok(_) => success += 1,
                        Err(_) => failed += 1,
                    }
                }

                println!("  Imported: {}", success);
                if failed > 0 {
                    println!("  Failed: {}", failed);
                }
            }
        }

        Commands::Status => {
            let response = client
                .http
                .get(format!("{}/health", client.base_url))
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: Value = resp.json().await?;

                    println!("Flarewatch v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!(
                        "API Status: {}",
                        health["status"].as_str().unwrap_or("unknown")
                    );
                    println!(
                        "Recommender: {}",
                        health["recommender"].as_str().unwrap_or("unknown")
                    );

                    if let Some(records) = health.get("records") {
                        println!();
                        println!("Records:");
                        for kind in RecordKind::all() {
                            println!(
                                "  {:<10} {}",
                                kind.to_string(),
                                records[kind.to_string()].as_u64().unwrap_or(0)
                            );
                        }
                    }

                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!();
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => {
                    bail!("API returned error: {}", resp.status());
                }
                Err(e) => {
                    eprintln!("Cannot connect to Flarewatch API at {}", client.base_url);
                    eprintln!("Error: {}", e);
                    eprintln!();
                    eprintln!("Make sure the Flarewatch API server is running:");
                    eprintln!("  cargo run --bin flarewatch-api");
                    std::process::exit(1);
                }
            }
        }

        Commands::Config { output } => {
            let config = flarewatch::config::generate_default_config();

            match output {
                Some(path) => {
                    // Create parent directory if needed
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

/// Thin JSON client for the API
struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    async fn get(&self, path: &str) -> anyhow::Result<Value> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .with_context(|| format!("connecting to {}", self.base_url))?;
        Self::read(response).await
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> anyhow::Result<Value> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("connecting to {}", self.base_url))?;
        Self::read(response).await
    }

    /// Body of a successful response; the API error message otherwise
    async fn read(response: reqwest::Response) -> anyhow::Result<Value> {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(body);
        }

        match body["error"]["message"].as_str() {
            Some(message) => bail!("{} ({})", message, status),
            None => bail!("Request failed ({})", status),
        }
    }
}

/// Resolve "today", "yesterday" or an explicit date to YYYY-MM-DD
fn resolve_date(s: &str) -> anyhow::Result<String> {
    let today = Local::now().date_naive();
    let date: NaiveDate = match s.trim().to_lowercase().as_str() {
        "today" => today,
        "yesterday" => today - Duration::days(1),
        other => match parse_record_date(other) {
            Some(date) => date,
            None => bail!("Invalid date: {}. Use today, yesterday, YYYY-MM-DD or RFC 3339", s),
        },
    };
    Ok(format_date(date))
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

fn join_strings(value: &Value) -> String {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

fn print_records(kind: RecordKind, records: &Value) {
    let rows = match records.as_array() {
        Some(rows) if !rows.is_empty() => rows,
        _ => {
            println!("No {} records yet", kind);
            return;
        }
    };

    match kind {
        RecordKind::Sleep => {
            println!("{:<12} {:>6} {:>8}  {}", "Date", "Hours", "Quality", "Disruptions");
            println!("{}", "-".repeat(50));
            for r in rows {
                println!(
                    "{:<12} {:>6.1} {:>8}  {}",
                    r["date"].as_str().unwrap_or("-"),
                    r["duration_hours"].as_f64().unwrap_or(0.0),
                    r["quality"].as_i64().unwrap_or(0),
                    r["disruptions"].as_str().unwrap_or("")
                );
            }
        }
        RecordKind::Diet => {
            println!("{:<12} {:<10} {}", "Date", "Meal", "Items");
            println!("{}", "-".repeat(50));
            for r in rows {
                println!(
                    "{:<12} {:<10} {}",
                    r["date"].as_str().unwrap_or("-"),
                    r["meal"].as_str().unwrap_or("-"),
                    join_strings(&r["items"])
                );
            }
        }
        RecordKind::Menstrual => {
            println!("{:<12} {:<10} {}", "Date", "Event", "Flow");
            println!("{}", "-".repeat(36));
            for r in rows {
                println!(
                    "{:<12} {:<10} {}",
                    r["date"].as_str().unwrap_or("-"),
                    r["period_event"].as_str().unwrap_or("-"),
                    r["flow_level"].as_str().unwrap_or("-")
                );
            }
        }
        RecordKind::Symptoms => {
            println!("{:<12} {:>7} {:>8} {:>5}", "Date", "Nausea", "Fatigue", "Pain");
            println!("{}", "-".repeat(36));
            for r in rows {
                println!(
                    "{:<12} {:>7} {:>8} {:>5}",
                    r["date"].as_str().unwrap_or("-"),
                    r["nausea"].as_i64().unwrap_or(0),
                    r["fatigue"].as_i64().unwrap_or(0),
                    r["pain"].as_i64().unwrap_or(0)
                );
            }
        }
    }
}

fn print_triggers(report: &Value) {
    println!(
        "Severity mean {:.2}, std dev {:.2}, spike threshold {:.2}",
        report["mean"].as_f64().unwrap_or(0.0),
        report["std_dev"].as_f64().unwrap_or(0.0),
        report["threshold"].as_f64().unwrap_or(0.0)
    );
    println!();

    let spikes = report["spike_days"].as_object();
    println!("Spike days: {}", spikes.map(|s| s.len()).unwrap_or(0));
    if let Some(spikes) = spikes {
        for (date, severity) in spikes {
            println!("  {}  {:.2}", date, severity.as_f64().unwrap_or(0.0));
        }
    }
    println!();

    println!("{:<24} {}", "Trigger (day before)", "Count");
    println!("{}", "-".repeat(32));
    println!(
        "{:<24} {}",
        "low sleep",
        report["low_sleep"]["count"].as_u64().unwrap_or(0)
    );
    for (section, label) in [
        ("food_items", "food"),
        ("menstrual_events", "period event"),
        ("flow_levels", "flow"),
    ] {
        if let Some(counts) = report[section]["counts"].as_object() {
            for (value, count) in counts {
                println!(
                    "{:<24} {}",
                    format!("{}: {}", label, value),
                    count.as_u64().unwrap_or(0)
                );
            }
        }
    }
}
