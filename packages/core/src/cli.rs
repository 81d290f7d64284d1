use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;

use crate::config::parse_watermark;
use crate::scheduler::Job;

/// Recently added notifier CLI arguments
#[derive(Debug, Parser)]
#[command(
    name = "recently-added-notifier",
    version,
    about = "Post newly added Plex movies and TV from Tautulli to a Discord webhook"
)]
pub struct Cli {
    /// Path to the JSON config file that also stores the watermark
    #[arg(long, short, default_value = "config.json")]
    pub config: PathBuf,

    /// Print the payloads instead of posting them; the watermark is not saved
    #[arg(long)]
    pub dry_run: bool,

    /// Repeat the pass every N seconds until Ctrl+C
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Report items added after this time instead of the saved watermark
    #[arg(long, value_parser = parse_since)]
    pub since: Option<DateTime<Utc>>,
}

fn parse_since(value: &str) -> Result<DateTime<Utc>, String> {
    parse_watermark(value).ok_or_else(|| format!("invalid timestamp: {}", value))
}

impl Cli {
    pub fn job(&self) -> Job {
        Job {
            config_path: self.config.clone(),
            dry_run: self.dry_run,
            since: self.since,
        }
    }
}
