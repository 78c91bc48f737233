use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "artfetch")]
#[command(about = "Artist directory importer for Kirby CMS", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover artist pages and import their images
    Import(ImportArgs),
    /// Print every link found on the listing page
    Links(CommonArgs),
    /// Fill the artist template from images already on disk
    Generate(CommonArgs),
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Configuration file (defaults to config/artfetch.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Read the listing page from a saved HTML file instead of the live site
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct CommonArgs {
    /// Configuration file (defaults to config/artfetch.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
