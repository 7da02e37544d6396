//! Per-document failures.
//!
//! Everything in here is caught at the batch boundary, logged, and counted.
//! None of these errors stop the batch.

use std::path::PathBuf;

/// Why a single document could not be turned into an output file.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The OCR service refused to start a job for this document.
    #[error("could not start text detection for {key}: {message}")]
    Submission { key: String, message: String },

    /// We could not ask the OCR service how a job is doing.
    #[error("could not query status of job {job_id}: {message}")]
    Status { job_id: String, message: String },

    /// The job reached the `FAILED` state.
    #[error("text detection job {job_id} failed")]
    JobFailed { job_id: String },

    /// The job did not finish within the configured timeout.
    #[error("text detection job {job_id} did not finish within {seconds}s")]
    JobTimedOut { job_id: String, seconds: u64 },

    /// A result page could not be fetched partway through the token chain.
    #[error("could not fetch result page {page_index} of job {job_id}: {message}")]
    Aggregation {
        job_id: String,
        page_index: usize,
        message: String,
    },

    /// The key cannot be turned into an output file, or its record could not
    /// be serialized.
    #[error("could not save results for {key}: {message}")]
    Persist { key: String, message: String },

    /// The filesystem refused the output file or one of its directories.
    #[error("could not write {path:?} for {key}: {source}")]
    WriteFile {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
