//! Command-line argument definitions

use clap::Args;

/// Arguments for the convert command
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input media file path or remote URL
    #[arg(short, long)]
    pub input: String,

    /// Target container format
    #[arg(short, long, default_value = "mp4")]
    pub format: String,

    /// Target video codec (default: chosen by the preset/container)
    #[arg(long)]
    pub codec: Option<String>,

    /// Quality preset
    #[arg(long, default_value = "standard")]
    pub preset: String,

    /// Ask the parameter advisor for content-aware overrides
    #[arg(long)]
    pub ai: bool,

    /// Skip output validation
    #[arg(long)]
    pub no_validate: bool,

    /// Scheduling priority hint
    #[arg(long, default_value = "normal")]
    pub priority: String,

    /// Print the final job record as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input media file path
    #[arg(short, long)]
    pub input: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the presets command
#[derive(Args, Debug)]
pub struct PresetsArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
