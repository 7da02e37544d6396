//! Reading and writing local files or standard streams.
//!
//! Subcommands that take an optional path read from stdin and write to stdout
//! when the path is missing. That logic lives here.

use tokio::{
    fs::File,
    io::{AsyncRead, AsyncReadExt as _, AsyncWrite, AsyncWriteExt as _},
};

use crate::prelude::*;

/// Open a file, or standard input if `path` is `None`.
async fn create_reader(
    path: Option<&Path>,
) -> Result<Box<dyn AsyncRead + Unpin + Send + Sync + 'static>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .await
                .with_context(|| format!("Failed to open file at path: {:?}", path))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(tokio::io::stdin())),
    }
}

/// Create a file, or use standard output if `path` is `None`.
pub async fn create_writer(
    path: Option<&Path>,
) -> Result<Box<dyn AsyncWrite + Unpin + Send + Sync + 'static>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .await
                .with_context(|| format!("Failed to create file at path: {:?}", path))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(tokio::io::stdout())),
    }
}

/// Read all of a UTF-8 text file, or all of standard input.
pub async fn read_text(path: Option<&Path>) -> Result<String> {
    let description = path.map_or_else(|| "stdin".to_owned(), |p| p.display().to_string());
    let mut reader = create_reader(path).await?;
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .await
        .with_context(|| format!("Failed to read UTF-8 text from {description}"))?;
    Ok(text)
}

/// Write `bytes` followed by a newline, then flush.
pub async fn write_bytes(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    let mut wtr = create_writer(path).await?;
    wtr.write_all(bytes).await.context("failed to write output")?;
    wtr.write_all(b"\n").await.context("failed to write output")?;
    wtr.flush().await.context("failed to flush output")?;
    Ok(())
}
