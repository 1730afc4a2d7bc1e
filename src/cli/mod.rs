//! CLI command implementations

pub mod error;
pub mod scan;
pub mod scrape;

pub use error::CliError;
pub use scan::ScanArgs;
pub use scrape::ScrapeArgs;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::catalog::pkmncards::DEFAULT_BASE_URL;

/// Pokemon card downloader CLI
#[derive(Parser, Debug)]
#[command(name = "pkmn-card-downloader")]
#[command(about = "Download Pokemon card images and metadata from pkmncards.com", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output directory for images and metadata
    #[arg(long, global = true, default_value = "pokemon_cards")]
    pub output: PathBuf,

    /// Base URL of the catalog's set listing
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download card images and write metadata artifacts
    Scrape(ScrapeArgs),

    /// Count sets and cards without downloading anything
    Scan(ScanArgs),
}
