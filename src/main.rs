//! FormatNorm CLI
//!
//! Media format normalization pipeline: converts files or URLs to a target
//! format/codec/quality profile, optionally applies AI-assisted parameter
//! tuning, and validates the result.
//!
//! # Usage
//!
//! ```bash
//! normalizer convert --input talk.mov --format mp4 --preset web
//! normalizer convert --input https://cdn.example.com/raw.mov --format mp4 --ai
//! normalizer inspect --input talk.mov --json
//! normalizer presets
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use formatnorm::cli::{commands, Cli, Commands};
use formatnorm::config::NormalizerConfig;

/// Main entry point for the normalizer CLI
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse command line arguments
    let cli = Cli::parse();
    let config = NormalizerConfig::load(cli.config.as_deref())?;

    // Execute the requested command
    match cli.command {
        Commands::Convert(args) => {
            info!("Executing convert command");
            commands::convert(args, config).await?;
        }
        Commands::Inspect(args) => {
            info!("Executing inspect command");
            commands::inspect(args, config).await?;
        }
        Commands::Presets(args) => {
            commands::presets(args)?;
        }
    }

    Ok(())
}
