//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "digitsight-demo")]
#[command(
    author,
    version,
    about = "Interactive digit-recognition demo with a browser widget"
)]
pub struct Cli {
    /// Listen port
    #[arg(short, long, default_value = "7860")]
    pub port: u16,

    /// Listen address
    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

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
    #[arg(short, long, default_value = "cpu")]
    pub device: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
