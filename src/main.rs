use std::str::FromStr;

use clap::{Parser, Subcommand};
use tracing_subscriber::{
    EnvFilter, Layer as _, filter::Directive, fmt::format::FmtSpan, layer::SubscriberExt,
    util::SubscriberInitExt as _,
};

use self::{prelude::*, ui::Ui};

mod async_utils;
mod aws;
mod batch;
mod cmd;
mod errors;
mod extract;
mod ocr;
mod output;
mod prelude;
mod rate_limit;
mod storage;
mod ui;

/// Extract structured data from CVs stored in S3, using AWS Textract.
#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    after_help = r#"
Environment Variables:
  Standard AWS environment variables and credential files are used
  to reach S3 and Textract (AWS_PROFILE, AWS_REGION, etc.).

  RUST_LOG controls log verbosity (default: info).

  These variables may be set in a standard `.env` file.
"#
)]
struct Opts {
    #[clap(subcommand)]
    subcmd: Cmd,
}

/// The subcommands we support.
#[derive(Debug, Subcommand)]
enum Cmd {
    /// OCR every PDF in an S3 bucket and write one JSON file per CV.
    Process(cmd::process::ProcessOpts),
    /// Extract CV fields from a local text file, without OCR.
    Extract(cmd::extract::ExtractOpts),
    /// Print JSON schemas for our output formats.
    Schema(cmd::schema::SchemaOpts),
}

/// Our entry point, which can return an error. [`anyhow::Result`] will
/// automatically print a nice error message with optional backtrace.
#[tokio::main]
async fn main() -> Result<()> {
    let ui = Ui::init();

    // Initialize tracing.
    let directive =
        Directive::from_str("info").expect("built-in directive should be valid");
    let env_filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_writer(ui.get_stderr_writer())
        .with_filter(env_filter);
    tracing_subscriber::registry().with(subscriber).init();

    real_main(ui).await
}

/// Our real entry point, once logging is set up.
#[instrument(level = "debug", name = "main", skip_all)]
async fn real_main(ui: Ui) -> Result<()> {
    // Load environment variables from a `.env` file, if it exists.
    dotenvy::dotenv().ok();

    let opts = Opts::parse();
    debug!("Parsed options: {:?}", opts);

    match &opts.subcmd {
        Cmd::Process(process_opts) => cmd::process::cmd_process(ui, process_opts).await,
        Cmd::Extract(extract_opts) => cmd::extract::cmd_extract(extract_opts).await,
        Cmd::Schema(schema_opts) => cmd::schema::cmd_schema(schema_opts).await,
    }
}
