use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "glovelink",
    version,
    about = "Collect samples from a GloveLink glove and summarize them",
    long_about = "Runs one ingestion session, either against the built-in mock glove \
                  (which streams fragmented notifications like a real serial bridge) \
                  or against the synthetic source, then prints a JSON summary.\n\
                  Set RUST_LOG to control log output (default: info)."
)]
pub struct Cli {
    /// Use the synthetic source instead of a device
    #[arg(long)]
    pub simulate: bool,

    /// Number of samples to collect before summarizing
    #[arg(long, default_value_t = 10)]
    pub ticks: usize,

    /// History window size
    #[arg(long, env = "GLOVELINK_CAPACITY", default_value_t = 50)]
    pub capacity: usize,

    /// Sample interval in milliseconds
    #[arg(long, env = "GLOVELINK_INTERVAL_MS", default_value_t = 500)]
    pub interval_ms: u64,

    /// Seed for reproducible synthetic data
    #[arg(long)]
    pub seed: Option<u64>,

    /// Patient label for the report
    #[arg(long, default_value = "anonymous")]
    pub patient: String,

    /// Device label for the report (defaults to the connected device name)
    #[arg(long)]
    pub device_label: Option<String>,

    /// Write the JSON summary to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Compact JSON output
    #[arg(long)]
    pub compact: bool,
}
