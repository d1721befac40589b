use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Fetches URLs twice and reports whether the cache answered the second time"
)]
pub struct CliArgs {
    /// URLs to check
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// YAML file with key and store settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
