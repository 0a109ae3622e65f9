//! CLI argument definitions for fgoplan-extract

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fgoplan-extract")]
#[command(about = "Build the fgoplan dataset from upstream game-data exports", long_about = None)]
pub struct Cli {
    /// Reuse cached exports without asking the API whether they changed
    #[arg(long)]
    pub skip_version_check: bool,

    /// Reference remote image URLs instead of caching them locally
    #[arg(long)]
    pub skip_image_download: bool,

    /// Directory for cached exports, images and the final dataset
    #[arg(short, long, default_value = "_build/data")]
    pub out_dir: PathBuf,

    /// Drop spreadsheet API key (overrides the config file)
    #[arg(long, env = "SHEETS_KEY", hide = true, hide_env_values = true)]
    pub sheets_key: Option<String>,

    /// Worker threads for downloads (overrides the config file)
    #[arg(short, long)]
    pub workers: Option<usize>,
}
