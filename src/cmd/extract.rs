//! The `extract` subcommand.
//!
//! Runs the field extractor on text we already have, without touching AWS.
//! Handy for checking how a CV's OCR output will be interpreted.

use clap::Args;

use crate::{
    async_utils::io::{read_text, write_bytes},
    extract::extract_fields,
    output::to_pretty_json,
    prelude::*,
};

/// Options for the `extract` subcommand.
#[derive(Debug, Args)]
pub struct ExtractOpts {
    /// A UTF-8 text file with one OCR line per line. Defaults to stdin.
    pub input_path: Option<PathBuf>,

    /// Where to write the JSON record. Defaults to stdout.
    #[clap(short = 'o', long = "out")]
    pub output_path: Option<PathBuf>,
}

/// The `extract` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_extract(opts: &ExtractOpts) -> Result<()> {
    let text = read_text(opts.input_path.as_deref()).await?;
    let record = extract_fields(&text);
    debug!(?record, "Extracted fields");
    write_bytes(opts.output_path.as_deref(), &to_pretty_json(&record)?).await
}
