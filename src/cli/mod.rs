//! CLI module
//!
//! This module handles command-line argument parsing and command execution.

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// Media format normalizer
///
/// Converts media files or URLs to a target format/codec/quality profile,
/// optionally applies AI-assisted parameter tuning, and validates the result.
#[derive(Parser)]
#[command(name = "normalizer")]
#[command(about = "Media format normalization pipeline")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, global = true, env = "FORMATNORM_CONFIG")]
    pub config: Option<std::path::PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a conversion and run it to completion
    Convert(args::ConvertArgs),
    /// Probe a media file and print its technical metadata
    Inspect(args::InspectArgs),
    /// List available quality presets
    Presets(args::PresetsArgs),
}
