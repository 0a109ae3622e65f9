mod atlas;
mod cli;
mod config;
mod converter;
mod events;
mod fetch;
mod images;
mod pipeline;
mod range;
mod sheets;
mod tasks;
mod webcrow;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info";

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let options = pipeline::Options {
        out_dir: cli.out_dir,
        api_base: config.api_base().to_string(),
        sheets_key: cli.sheets_key.or_else(|| config.sheets_key.clone()),
        skip_version_check: cli.skip_version_check,
        skip_image_download: cli.skip_image_download,
        workers: cli.workers.unwrap_or_else(|| config.workers()),
    };

    pipeline::run(&options)
}
