use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// Send receipt images to the sorting service and download the compiled document.
#[derive(Debug, Clone, Parser)]
#[command(name = "receipt-sorter", version, about)]
pub struct Cli {
    /// Receipt images, or folders containing them.
    #[arg(required = true, value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Where the finished document is saved.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Stop once the job succeeds instead of downloading the document.
    #[arg(long)]
    pub no_download: bool,

    /// Configuration file (RON).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Receipt processor address, e.g. http://127.0.0.1:8000
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Reconnects allowed before a dropped event stream fails the job.
    #[arg(long, value_name = "N")]
    pub max_reconnect_attempts: Option<u32>,

    /// Also log to the terminal; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
