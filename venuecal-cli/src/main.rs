mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use venuecal_core::config::MergeConfig;

#[derive(Parser)]
#[command(name = "venuecal")]
#[command(about = "Merge and deduplicate venue events from curated listings and calendar feeds")]
struct Cli {
    /// Path to the venuecal config file
    #[arg(short, long, default_value = "venuecal.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build one deduplicated .ics calendar per raw data file
    Generate {
        /// Directory of raw event JSON files
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Directory for the generated .ics files
        #[arg(long, default_value = "calendars")]
        out_dir: PathBuf,
    },
    /// Fetch feeds, merge with curated calendars, write one .ics file
    Merge {
        /// Output .ics file
        #[arg(short, long, default_value = "merged.ics")]
        out: PathBuf,

        /// Directory of curated .ics files to include
        #[arg(long)]
        custom_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = MergeConfig::load(&cli.config)?;

    match cli.command {
        Commands::Generate { data_dir, out_dir } => {
            commands::generate::run(&config, &data_dir, &out_dir)
        }
        Commands::Merge { out, custom_dir } => {
            commands::merge::run(&config, &out, custom_dir.as_deref()).await
        }
    }
}
