use crate::cli::args::{Cli, Commands};
use crate::config::IngestConfig;
use crate::error::Result;
use crate::processors::{BatchReport, IngestionDriver};
use crate::readers::{read_sounding_text, HeaderLocator, TableParser};
use crate::store::LaunchStore;
use crate::utils::logging::init_logging;
use crate::utils::progress::ProgressReporter;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn run(cli: Cli) -> Result<()> {
    let mut config = IngestConfig::load(cli.config.as_deref())?;

    // Only a batch run writes the configured log file; the other commands
    // log to a file only when asked to.
    let log_file: Option<PathBuf> = match cli.command {
        Commands::Ingest { .. } => cli.log_file.clone().or_else(|| config.log_file()),
        _ => cli.log_file.clone(),
    };
    init_logging(cli.verbose, log_file.as_deref())?;

    match cli.command {
        Commands::Ingest {
            root,
            database,
            append,
            json,
            quiet,
        } => {
            if let Some(root) = root {
                config.data_root = root.display().to_string();
            }
            if let Some(url) = database {
                config.database_url = url;
            }
            if append {
                config.reset_before_run = false;
            }
            config.check()?;

            ingest(&config, json, quiet)?;
        }

        Commands::Inspect { file } => inspect(&file)?,

        Commands::Launches { database } => {
            let store = open_existing(&mut config, database)?;
            let launches = store.launches()?;

            println!("{} launches in {}", launches.len(), store.target());
            for launch in &launches {
                println!(
                    "{:>6}  {}  {}",
                    launch.id,
                    launch.launch_date.format("%Y-%m-%d %H:%M:%S UTC"),
                    launch.filename
                );
            }
            store.close()?;
        }

        Commands::Monthly {
            year,
            month,
            database,
        } => {
            let store = open_existing(&mut config, database)?;
            let performance = store.monthly_performance(year, month)?;

            println!("Monthly performance for {}-{:02}:", year, month);
            if performance.is_empty() {
                println!("  No launches recorded");
            }
            for day in &performance {
                let altitude = day
                    .max_altitude
                    .map(|a| format!("{:.1} m", a))
                    .unwrap_or_else(|| "n/a".to_string());
                println!(
                    "  day {:>2}: max altitude {}, ascent time {:.1} min",
                    day.day, altitude, day.ascent_time_minutes
                );
            }
            store.close()?;
        }
    }

    Ok(())
}

fn ingest(config: &IngestConfig, json: bool, quiet: bool) -> Result<()> {
    info!("--- Starting data ingestion ---");

    let report = run_ingest(config, quiet)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n{}", report.summary());
    }

    info!("--- Data ingestion finished ---");
    Ok(())
}

/// Discovery runs before the store is reset, so a bad root leaves an existing
/// database untouched.
fn run_ingest(config: &IngestConfig, quiet: bool) -> Result<BatchReport> {
    let driver = IngestionDriver::new();
    let discovery = ProgressReporter::new_spinner("Discovering sounding files...", quiet);
    let files = driver.discover(&config.data_root())?;
    discovery.finish_and_clear();

    let target = config.database_target()?;
    let mut store = if config.reset_before_run {
        LaunchStore::reset(&target)?
    } else {
        LaunchStore::open(&target)?
    };
    info!(database = %target, reset = config.reset_before_run, "Database tables ready");

    let progress = ProgressReporter::new(files.len() as u64, "Loading soundings...", quiet);
    let report = driver.load_files(&mut store, files, Some(&progress));
    store.close()?;

    Ok(report)
}

fn inspect(file: &Path) -> Result<()> {
    let text = read_sounding_text(file)?;
    let metadata = HeaderLocator::new().locate(&text)?;
    let table = TableParser::new().parse_table(&text, metadata.header_line)?;

    let loaded: Vec<&str> = table
        .loaded_fields()
        .iter()
        .map(|f| f.column_name())
        .collect();

    println!("File: {}", file.display());
    println!("Launch time: {}", metadata.launch_date.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Header line: {}", metadata.header_line + 1);
    println!("Columns loaded: {}", loaded.join(" "));
    if !table.ignored_columns.is_empty() {
        println!("Columns ignored: {}", table.ignored_columns.join(" "));
    }
    println!("Data rows: {}", table.records.len());

    Ok(())
}

fn open_existing(config: &mut IngestConfig, database: Option<String>) -> Result<LaunchStore> {
    if let Some(url) = database {
        config.database_url = url;
    }
    config.check()?;
    LaunchStore::open_existing(&config.database_target()?)
}
