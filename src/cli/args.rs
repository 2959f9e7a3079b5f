use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sounding-ingest")]
#[command(about = "Load radiosonde soundings into a SQLite store")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load every sounding under a directory tree
    Ingest {
        #[arg(short, long, help = "Dataset root directory [default: from config, else .]")]
        root: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Database URL, e.g. sqlite:///database.db [default: from config]"
        )]
        database: Option<String>,

        #[arg(short, long, help = "Keep the existing database instead of resetting it")]
        append: bool,

        #[arg(long, help = "Print the batch report as JSON")]
        json: bool,

        #[arg(short, long, help = "Hide the progress bar")]
        quiet: bool,
    },

    /// Locate and parse one file without touching the database
    Inspect {
        #[arg(short, long, help = "Sounding file to inspect")]
        file: PathBuf,
    },

    /// List stored launches, newest first
    Launches {
        #[arg(short, long, help = "Database URL [default: from config]")]
        database: Option<String>,
    },

    /// Best altitude and ascent time per day of a month
    Monthly {
        #[arg(short, long)]
        year: i32,

        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,

        #[arg(short, long, help = "Database URL [default: from config]")]
        database: Option<String>,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Ingest { .. } => "ingest",
            Commands::Inspect { .. } => "inspect",
            Commands::Launches { .. } => "launches",
            Commands::Monthly { .. } => "monthly",
        }
    }
}
