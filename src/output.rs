//! Writing one JSON file per processed document.

use std::path::Component;

use schemars::JsonSchema;
use serde_json::ser::PrettyFormatter;

use crate::{errors::DocumentError, extract::StructuredRecord, prelude::*};

/// The output written for each successfully processed document.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Eq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutputEnvelope {
    /// The object key of the source document.
    pub filename: String,

    /// The fields extracted from the document.
    pub structured_data: StructuredRecord,
}

/// Serialize a value as pretty JSON with four-space indentation.
///
/// Non-ASCII characters are written as-is, not escaped.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .context("failed to serialize JSON")?;
    Ok(buf)
}

/// The relative output path for a document key: the trailing `.pdf` becomes
/// `.json`. Keys with `/` map to nested paths.
///
/// Keys that would escape the output directory are rejected.
pub fn output_file_name(key: &str) -> Result<PathBuf, DocumentError> {
    let reject = |why: &str| DocumentError::Persist {
        key: key.to_owned(),
        message: why.to_owned(),
    };
    let stem = key.strip_suffix(".pdf").unwrap_or(key);
    if stem.is_empty() {
        return Err(reject("key has no file name"));
    }
    let path = PathBuf::from(format!("{stem}.json"));
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(reject("key contains `..`")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(reject("key is an absolute path"));
            }
        }
    }
    Ok(path)
}

/// Write `envelope` into `output_dir`, creating parent directories for nested
/// keys. Returns the path written.
#[instrument(level = "debug", skip_all, fields(key = %envelope.filename))]
pub async fn write_envelope(
    output_dir: &Path,
    envelope: &OutputEnvelope,
) -> Result<PathBuf, DocumentError> {
    let write_error = |path: &Path, source: std::io::Error| DocumentError::WriteFile {
        key: envelope.filename.clone(),
        path: path.to_owned(),
        source,
    };

    let path = output_dir.join(output_file_name(&envelope.filename)?);
    let json = to_pretty_json(envelope).map_err(|e| DocumentError::Persist {
        key: envelope.filename.clone(),
        message: format!("{e:#}"),
    })?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| write_error(parent, e))?;
    }
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| write_error(path.as_path(), e))?;
    Ok(path)
}
