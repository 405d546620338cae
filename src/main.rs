use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use structrans::cli::{Cli, Commands};
use structrans::{config, translate};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Csv(args) => translate::run_csv(args, config_path)?,
        Commands::Xml(args) => translate::run_xml(args, config_path)?,
        Commands::Batch(args) => translate::run_batch(args, config_path)?,
        Commands::Config(args) => config::commands::run(args, config_path)?,
    }

    Ok(())
}
