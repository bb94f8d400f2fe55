use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use popup_pipeline::config::Config;
use popup_pipeline::export::write_enriched_json;
use popup_pipeline::ingest::{load_cities, load_popups};
use popup_pipeline::logging;
use popup_pipeline::pipeline::dedupe::ReferenceIndex;
use popup_pipeline::pipeline::normalize::CityAliases;
use popup_pipeline::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "popup_pipeline")]
#[command(about = "Retail pop-up event data cleaning and enrichment pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean both datasets, join them and derive the business metrics
    Run {
        /// Pop-up events CSV
        #[arg(long)]
        popups: PathBuf,
        /// GeoNames city reference CSV
        #[arg(long)]
        cities: PathBuf,
        /// TOML file with extra city aliases
        #[arg(long)]
        aliases: Option<PathBuf>,
        /// Write enriched records to this JSON file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Inspect duplicate city keys in the reference dataset
    Cities {
        /// GeoNames city reference CSV
        #[arg(long)]
        cities: PathBuf,
    },
}

fn main() -> ExitCode {
    // Initialize logging
    logging::init_logging();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run {
            popups,
            cities,
            aliases,
            out,
        } => run_pipeline(&popups, &cities, aliases.as_deref(), out.as_deref()),
        Commands::Cities { cities } => inspect_cities(&cities),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run failed: {e}");
            println!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_pipeline(
    popups_path: &std::path::Path,
    cities_path: &std::path::Path,
    aliases_path: Option<&std::path::Path>,
    out_path: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    println!("🔄 Running pop-up enrichment pipeline...");

    let aliases = match aliases_path {
        Some(path) => Config::load(path)?.city_aliases(),
        None => CityAliases::default(),
    };

    let (popup_records, load_report) = load_popups(popups_path)?;
    println!(
        "   Loaded {} pop-up records ({} unparsable start dates, {} unparsable end dates)",
        load_report.rows, load_report.unparsable_start_dates, load_report.unparsable_end_dates
    );

    let city_records = load_cities(cities_path)?;
    println!("   Loaded {} reference cities", city_records.len());

    let output = Pipeline::with_aliases(aliases).run(&popup_records, &city_records);

    println!("\n📊 Pipeline Results:");
    println!("   Input records: {}", popup_records.len());
    println!("   Enriched: {}", output.enriched.len());
    println!("   Failed hard validation: {}", output.failures.len());
    println!(
        "   Reference keys collapsed: {}",
        output.reference_collisions.len()
    );

    if !output.failures.is_empty() {
        warn!(
            "{} records dropped by hard validation",
            output.failures.len()
        );
        println!("\n⚠️  Dropped records:");
        for failure in &output.failures {
            println!("   - {}: {}", failure.event_id, failure.error);
        }
    }

    println!(
        "\n🔍 QC report ({} records checked):",
        output.report.records_checked
    );
    for (name, finding) in output.report.findings() {
        if finding.count > 0 {
            println!("   {}: {}", name, finding.count);
        }
    }
    if output.report.is_clean() {
        println!("   No anomalies found");
    }

    if let Some(path) = out_path {
        write_enriched_json(path, &output.enriched)?;
        println!("\n✅ Wrote {} enriched records to {}", output.enriched.len(), path.display());
    } else {
        println!("\n✅ Pipeline run completed (no output file requested)");
    }

    Ok(())
}

fn inspect_cities(cities_path: &std::path::Path) -> anyhow::Result<()> {
    println!("🔄 Deduplicating city reference...");

    let city_records = load_cities(cities_path)?;
    let index = ReferenceIndex::build(&city_records);

    println!("\n📊 Reference summary:");
    println!("   Input rows: {}", city_records.len());
    println!("   Distinct canonical keys: {}", index.len());
    println!("   Keys with duplicates: {}", index.collisions().len());
    info!(
        duplicate_keys = index.collisions().len(),
        "reference inspection complete"
    );

    if index.collisions().is_empty() {
        println!("\n✅ No duplicate keys found");
        return Ok(());
    }

    println!("\n⚠️  Collapsed keys:");
    for collision in index.collisions() {
        let note = if collision.tie_broken {
            " (population tie, first entry kept)"
        } else {
            ""
        };
        println!(
            "   - '{}': {} entries, kept geoname {}{}",
            collision.key, collision.entries, collision.chosen_geoname_id, note
        );
    }

    Ok(())
}
