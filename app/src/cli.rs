//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

/// Scan a numeric code space and report valid codes.
#[derive(Debug, Parser)]
#[command(name = "keyprobe", version, about)]
pub struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, env = "KEYPROBE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Validate the configuration and exit without scanning
    #[arg(long)]
    pub check_config: bool,
}
