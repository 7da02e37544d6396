//! The `schema` subcommand.

use clap::{Args, ValueEnum};
use schemars::schema_for;

use crate::{
    async_utils::io::write_bytes, extract::StructuredRecord, output::OutputEnvelope,
    prelude::*,
};

/// The output types we can describe.
///
/// We parse these as PascalCase, because they represent type names.
#[derive(Debug, Clone, Copy, ValueEnum)]
#[clap(rename_all = "PascalCase")]
pub enum SchemaType {
    /// The fields extracted from one CV.
    StructuredRecord,
    /// One output file, wrapping a record with its source key.
    OutputEnvelope,
}

/// Options for the `schema` subcommand.
#[derive(Debug, Args)]
pub struct SchemaOpts {
    /// The schema type to generate.
    #[clap(value_enum, value_name = "TYPE")]
    pub schema_type: SchemaType,

    /// The output path to write the schema to.
    #[clap(short = 'o', long = "out")]
    pub output_path: Option<PathBuf>,
}

/// The `schema` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_schema(opts: &SchemaOpts) -> Result<()> {
    let schema = match opts.schema_type {
        SchemaType::StructuredRecord => schema_for!(StructuredRecord),
        SchemaType::OutputEnvelope => schema_for!(OutputEnvelope),
    };
    let schema_str =
        serde_json::to_string_pretty(&schema).context("failed to serialize schema")?;
    write_bytes(opts.output_path.as_deref(), schema_str.as_bytes()).await
}
