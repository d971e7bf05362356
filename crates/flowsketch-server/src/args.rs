use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments for the flowsketch service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration file
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
