use clap::Parser;
use dotenvy::dotenv;

use recently_added_notifier::cli::Cli;
use recently_added_notifier::logging::init_logging;
use recently_added_notifier::scheduler::{self, log_report};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let job = cli.job();

    let result = match cli.interval {
        Some(interval) => scheduler::run_polling(job, interval).await,
        None => scheduler::run_pass(&job).await.map(|report| log_report(&report)),
    };

    if let Err(err) = result {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}
