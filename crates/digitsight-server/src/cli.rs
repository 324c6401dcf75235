//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "digitsight-server")]
#[command(about = "Digitsight digit-classification HTTP API", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "digitsight.yaml")]
    pub config: String,

    /// Hugging Face repository of the digit checkpoint
    #[arg(short, long)]
    pub model_repo: Option<String>,

    /// Checkpoint revision
    #[arg(short, long)]
    pub revision: Option<String>,

    /// Local directory with model artifacts (overrides the Hub repo)
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Inference device: cpu, cuda[:n], or metal[:n]
    #[arg(short, long)]
    pub device: Option<String>,

    /// Listen address
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
