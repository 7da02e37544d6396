//! The `process` subcommand.

use std::{sync::Arc, time::Duration};

use clap::Args;

use crate::{
    aws::AwsClients,
    batch::BatchProcessor,
    ocr::{poller::JobPoller, textract::TextractOcrService},
    prelude::*,
    rate_limit::ApiRateLimit,
    storage::s3::S3DocumentStore,
    ui::Ui,
};

/// Options for the `process` subcommand.
#[derive(Debug, Args)]
pub struct ProcessOpts {
    /// The S3 bucket containing the CVs. Only keys ending in `.pdf` are
    /// processed.
    pub bucket: String,

    /// Directory to write one JSON file per CV into. Created if missing.
    #[clap(short = 'o', long = "out", default_value = "structured_cvs")]
    pub output_dir: PathBuf,

    /// Seconds to wait between job status checks.
    #[clap(long, default_value = "2")]
    pub poll_interval: f64,

    /// Give up on any single Textract job after this many seconds. By
    /// default, we wait forever.
    #[clap(long)]
    pub job_timeout: Option<u64>,

    /// Maximum Textract request rate, as `N/s` or `N/m`.
    #[clap(long, default_value_t = ApiRateLimit::default())]
    pub rate_limit: ApiRateLimit,
}

/// The `process` subcommand.
#[instrument(level = "debug", skip_all, fields(bucket = %opts.bucket))]
pub async fn cmd_process(ui: Ui, opts: &ProcessOpts) -> Result<()> {
    let poll_interval = Duration::try_from_secs_f64(opts.poll_interval)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| anyhow!("--poll-interval must be a positive number of seconds"))?;

    let clients = AwsClients::from_env().await?;
    let processor = BatchProcessor::new(
        Arc::new(S3DocumentStore::new(clients.s3)),
        Arc::new(TextractOcrService::new(clients.textract, opts.rate_limit)),
        JobPoller::new(poll_interval),
        opts.output_dir.clone(),
    )
    .with_job_timeout(opts.job_timeout.map(Duration::from_secs));

    let summary = processor.run(&ui, &opts.bucket).await?;
    if summary.failed > 0 {
        warn!(
            "{} of {} documents could not be processed; see the log above",
            summary.failed, summary.found
        );
    }
    Ok(())
}
