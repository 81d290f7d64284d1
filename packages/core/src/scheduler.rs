//! Pass scheduling.
//!
//! A pass loads the config file, runs [`run_once`] against Tautulli and
//! Discord, and saves the new watermark back into the same file. With an
//! interval the pass repeats until Ctrl+C; any error still ends the process.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::signal;
use tokio::time;

use crate::config::Config;
use crate::error::AppError;
use crate::notify::discord::DiscordWebhook;
use crate::notify::{DryRunSink, NotificationSink};
use crate::runner::{run_once, RunReport, RunSettings};
use crate::services::TautulliClient;

#[derive(Debug, Clone)]
pub struct Job {
    pub config_path: PathBuf,
    pub dry_run: bool,
    /// Replaces the saved watermark for the next pass only.
    pub since: Option<DateTime<Utc>>,
}

/// Execute a single pass and persist the watermark if it moved.
pub async fn run_pass(job: &Job) -> Result<RunReport, AppError> {
    let config = Config::load(&job.config_path)?;

    let source = TautulliClient::new(&config.tautulli_url, &config.tautulli_api_key)
        .with_image_size(config.image_width, config.image_height);
    let sink: Box<dyn NotificationSink + Send + Sync> = if job.dry_run {
        Box::new(DryRunSink)
    } else {
        Box::new(DiscordWebhook::new(config.require_webhook()?))
    };

    let mut settings = RunSettings::from_config(&config);
    if let Some(since) = job.since {
        settings.watermark = Some(since);
    }

    let report = run_once(&source, &*sink, &settings, Utc::now()).await?;

    // --since may start below the saved watermark; never write an older one.
    let moved_past_saved = config
        .last_run_timestamp
        .map_or(true, |saved| report.watermark > saved);
    if sink.persists() && report.advanced() && moved_past_saved {
        Config::save_watermark(&job.config_path, report.watermark)?;
        tracing::info!("Watermark saved: {}", report.watermark.to_rfc3339());
    }

    Ok(report)
}

/// Repeat [`run_pass`] every `interval_seconds` until Ctrl+C.
pub async fn run_polling(mut job: Job, interval_seconds: u64) -> Result<(), AppError> {
    let mut interval = time::interval(Duration::from_secs(interval_seconds));

    tracing::info!("Polling started (interval: {}s)", interval_seconds);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = run_pass(&job).await?;
                log_report(&report);
                job.since = None;
            }

            _ = signal::ctrl_c() => {
                tracing::info!("Shutdown signal received. Stopping polling.");
                break;
            }
        }
    }

    tracing::info!("Polling stopped cleanly");
    Ok(())
}

pub fn log_report(report: &RunReport) {
    tracing::info!(
        "Pass finished: {} movies, {} shows, {} messages; watermark {}",
        report.movies,
        report.shows,
        report.messages,
        report.watermark.to_rfc3339()
    );
}
