mod error;
mod fetcher;
mod harvest;
mod parser;
mod settings;
mod store;
mod targets;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;

use fetcher::{DocumentSource, WikiClient};
use harvest::HarvestOptions;
use parser::classify::classify_row;
use parser::ident::IdRegistry;
use settings::Settings;
use store::{Record, RecordStore};

#[derive(Parser)]
#[command(name = "doom_harvest", about = "Harvest failed predictions from Wikipedia tables")]
struct Cli {
    /// Dataset file (default: data/doom.json, or DOOM_DATA_PATH)
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    /// Target list (default: curator.txt, or DOOM_CURATOR_PATH)
    #[arg(long, global = true)]
    curator: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every target and collect new records (dry run unless --write)
    Harvest {
        /// Merge the new records into the dataset file
        #[arg(long)]
        write: bool,
        /// Max new records (0 = unlimited)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Only process targets whose title contains this
        #[arg(short, long)]
        source: Option<String>,
    },
    /// Show how every table row of one article is classified
    Inspect {
        /// Article title
        title: String,
        /// Extra text used for category guessing
        #[arg(long, default_value = "")]
        hint: String,
    },
    /// List the parsed target list
    Targets {
        /// Only targets whose title contains this
        #[arg(short, long)]
        source: Option<String>,
    },
    /// Dataset statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(data) = cli.data {
        settings.data_path = data;
    }
    if let Some(curator) = cli.curator {
        settings.curator_path = curator;
    }

    let result = match cli.command {
        Commands::Harvest {
            write,
            limit,
            source,
        } => run_harvest(&settings, write, limit, source.as_deref()).await,
        Commands::Inspect { title, hint } => run_inspect(&settings, &title, &hint).await,
        Commands::Targets { source } => {
            let list = load_targets(&settings, source.as_deref())?;
            for t in &list {
                if t.hint.is_empty() {
                    println!("{}", t.title);
                } else {
                    println!("{}  | {}", t.title, t.hint);
                }
            }
            println!("\n{} target(s)", list.len());
            Ok(())
        }
        Commands::Stats => {
            let store = RecordStore::load(&settings.data_path)?;
            print_stats(&store);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run_harvest(
    settings: &Settings,
    write: bool,
    limit: Option<usize>,
    source: Option<&str>,
) -> anyhow::Result<()> {
    let mut store = RecordStore::load(&settings.data_path)?;
    let mut ids = IdRegistry::new(store.ids());
    println!("Existing entries: {}", ids.len());

    let list = load_targets(settings, source)?;
    println!("Curator targets: {}\n", list.len());

    let client = WikiClient::new(&settings.api_url, &settings.user_agent, settings.timeout())?;
    let opts = HarvestOptions {
        limit,
        throttle: settings.throttle(),
        error_pause: settings.error_pause(),
    };
    let run = harvest::harvest(&client, &list, &mut ids, &opts).await;

    if run.stats.limit_reached {
        if let Some(n) = limit {
            println!("Limit of {} reached.", n);
        }
    }
    println!(
        "Fetched {} of {} documents ({} failed), {} tables, {} rows",
        run.stats.fetched, run.stats.targets, run.stats.failed, run.stats.tables, run.stats.rows
    );
    for (kind, n) in &run.stats.rejected {
        println!("  skipped {:<18} {}", kind, n);
    }
    println!("\nFound {} new entries", run.records.len());

    if run.records.is_empty() {
        println!("Nothing to add.");
        return Ok(());
    }

    print_preview(&run.records);

    if write {
        store.append(&run.records)?;
        store.save()?;
        println!(
            "\nWrote {} entries to {}",
            run.records.len(),
            store.path().display()
        );
        println!("Total entries now: {}", store.len());
        println!("\nReview entries with \"_harvested\": true before committing.");
    } else {
        println!("\nDry run, nothing written. Add --write to save.");
    }
    Ok(())
}

async fn run_inspect(settings: &Settings, title: &str, hint: &str) -> anyhow::Result<()> {
    let client = WikiClient::new(&settings.api_url, &settings.user_agent, settings.timeout())?;
    let markup = client
        .fetch_markup(title)
        .await
        .with_context(|| format!("Failed to fetch {}", title))?;

    let mut ids = known_ids(&settings.data_path);
    let hint = format!("{} {}", hint, title);

    let tables = parser::tables::extract_tables(&markup);
    println!("{}: {} table(s)", title, tables.len());
    for (ti, table) in tables.iter().enumerate() {
        println!("\n--- Table {} ({} rows) ---", ti + 1, table.len());
        for (ri, row) in table.iter().enumerate() {
            let lead = truncate(row.first().map(String::as_str).unwrap_or(""), 20);
            match classify_row(row, &hint, &ids) {
                Ok(rec) => {
                    println!("{:>3} | {:<20} | + {} [{}]", ri + 1, lead, rec.id, rec.category);
                    ids.insert(rec.id);
                }
                Err(reason) => println!("{:>3} | {:<20} | - {}", ri + 1, lead, reason),
            }
        }
    }
    Ok(())
}

/// Ids already in the dataset; inspecting still works when it cannot be read.
fn known_ids(path: &std::path::Path) -> IdRegistry {
    match RecordStore::load(path) {
        Ok(store) => IdRegistry::new(store.ids()),
        Err(e) => {
            warn!("{:#}", e);
            IdRegistry::default()
        }
    }
}

fn load_targets(settings: &Settings, source: Option<&str>) -> anyhow::Result<Vec<targets::Target>> {
    let list = targets::load(&settings.curator_path)?;
    Ok(targets::filter_by_title(list, source.unwrap_or("")))
}

fn print_preview(records: &[Record]) {
    println!("\n--- Preview (first 5) ---");
    for r in records.iter().take(5) {
        println!(
            "  [{}] {:<30}  ->  {}...",
            r.year,
            truncate_plain(&r.source, 30),
            truncate_plain(&r.prediction, 60)
        );
    }
    if records.len() > 5 {
        println!("  ... and {} more", records.len() - 5);
    }
}

fn print_stats(store: &RecordStore) {
    if store.is_empty() {
        println!("Dataset {} has no entries.", store.path().display());
        return;
    }
    let records = store.records();
    let harvested = records.iter().filter(|r| r.harvested).count();
    let mut by_category: BTreeMap<&str, usize> = BTreeMap::new();
    for r in &records {
        *by_category.entry(r.category.as_str()).or_default() += 1;
    }

    println!("Entries:    {}", store.len());
    println!("Harvested:  {}", harvested);
    println!("Off-schema: {}", store.len() - records.len());
    println!("\n--- By category ---");
    for (category, n) in by_category {
        println!("  {:<26} {}", category, n);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn truncate_plain(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
