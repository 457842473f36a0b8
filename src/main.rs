mod client;
mod collect;
mod db;
mod export;

use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;

use client::chrome::ChromeClient;
use collect::sources::{self, SourceSpec};

#[derive(Parser)]
#[command(name = "webinar_scraper", about = "On-demand webinar listing aggregator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect every source and upsert into the local store
    Run {
        /// Only run the named source (Syndio, WorldatWork, Pave)
        #[arg(short, long)]
        source: Option<String>,
    },
    /// Print the store contents
    List {
        /// Filter by source
        #[arg(short, long)]
        source: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "100")]
        limit: usize,
    },
    /// Show store statistics
    Stats,
    /// Push the current records to the configured Coda table
    Export,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { source } => run_collectors(source.as_deref()).await,
        Commands::List { source, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_all(&conn, source.as_deref(), Some(limit))?;
            print_table(&rows);
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let stats = db::get_stats(&conn)?;
            println!("Total:       {}", stats.total);
            println!("With date:   {}", stats.dated);
            println!("Missing:     {}", stats.total - stats.dated);
            for (source, count) in &stats.per_source {
                println!("  {:<12} {}", source, count);
            }
            Ok(())
        }
        Commands::Export => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let records = db::fetch_all(&conn, None, None)?;
            let exporter = export::CodaExporter::from_env()?;
            let sent = exporter.push(&records).await?;
            println!("Exported {} new rows ({} total in store)", sent, records.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

struct SourceReport {
    name: &'static str,
    discovered: usize,
    skipped: usize,
    inserted: usize,
    updated: usize,
}

/// One source at a time: seed the dedup filter from the store, collect,
/// upsert. A failing source logs and reports zero records; the remaining
/// sources still run.
async fn run_collectors(filter: Option<&str>) -> Result<()> {
    let conn = db::connect()?;
    db::init_schema(&conn)?;

    let specs: Vec<&SourceSpec> = sources::SOURCES
        .iter()
        .filter(|s| filter.is_none_or(|f| s.name.eq_ignore_ascii_case(f)))
        .collect();
    if specs.is_empty() {
        anyhow::bail!("unknown source {:?}", filter.unwrap_or_default());
    }

    let chrome = ChromeClient::launch().await?;
    let mut reports = Vec::new();

    for spec in specs {
        let existing = db::existing_links(&conn, spec.name)?;
        println!("Running {} ({} known links)...", spec.name, existing.len());

        let outcome = match collect::run_source(&chrome, spec, &existing).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("{} failed: {:#}", spec.name, e);
                collect::SourceOutcome {
                    records: Vec::new(),
                    discovered: 0,
                    skipped: 0,
                }
            }
        };

        let (inserted, updated) = db::upsert_all(&conn, &outcome.records)?;
        println!(
            "  {} discovered, {} skipped (known), {} inserted, {} updated",
            outcome.discovered, outcome.skipped, inserted, updated
        );
        reports.push(SourceReport {
            name: spec.name,
            discovered: outcome.discovered,
            skipped: outcome.skipped,
            inserted,
            updated,
        });
    }

    chrome.close().await?;

    let total_inserted: usize = reports.iter().map(|r| r.inserted).sum();
    let total_updated: usize = reports.iter().map(|r| r.updated).sum();
    println!("\n{}", "=".repeat(72));
    println!(
        "{:<12} | {:>10} | {:>8} | {:>8} | {:>8}",
        "SOURCE", "DISCOVERED", "SKIPPED", "INSERTED", "UPDATED"
    );
    for r in &reports {
        println!(
            "{:<12} | {:>10} | {:>8} | {:>8} | {:>8}",
            r.name, r.discovered, r.skipped, r.inserted, r.updated
        );
    }
    println!("{}", "=".repeat(72));
    println!("Complete. Inserted: {}, Updated: {}", total_inserted, total_updated);

    println!("\nStore contents:");
    print_table(&db::fetch_all(&conn, None, None)?);
    Ok(())
}

fn print_table(rows: &[db::WebinarRecord]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }
    println!("{:<12} | {:<20} | TITLE", "SOURCE", "AIR DATE");
    println!("{}", "-".repeat(100));
    for row in rows {
        let date = row.air_date.as_deref().unwrap_or("N/A");
        println!(
            "{:<12} | {:<20} | {}",
            row.source,
            truncate(date, 20),
            truncate(&row.title, 60)
        );
    }
    println!("{} rows", rows.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
