//! Processing every CV in a bucket, one at a time.

use std::{sync::Arc, time::Duration};

use indicatif::ProgressBar;

use crate::{
    errors::DocumentError,
    extract::extract_fields,
    ocr::{
        OcrService,
        aggregate::{fetch_all_pages, flatten_lines},
        poller::JobPoller,
    },
    output::{OutputEnvelope, write_envelope},
    prelude::*,
    storage::{DocumentRef, DocumentStore, list_pdf_documents},
    ui::{ProgressConfig, Ui},
};

/// What happened during a batch run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// PDFs found in the bucket.
    pub found: usize,
    /// Output files written.
    pub saved: usize,
    /// Documents skipped because of an error.
    pub failed: usize,
}

/// Drives submit → poll → fetch → extract → save for each document.
///
/// Documents are processed strictly in sequence, with one OCR job in flight
/// at a time. A failure on one document is logged and the batch moves on.
pub struct BatchProcessor {
    store: Arc<dyn DocumentStore>,
    ocr: Arc<dyn OcrService>,
    poller: JobPoller,
    output_dir: PathBuf,

    /// Give up on a job that hasn't finished after this long.
    job_timeout: Option<Duration>,
}

impl BatchProcessor {
    /// Create a new batch processor writing into `output_dir`.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        ocr: Arc<dyn OcrService>,
        poller: JobPoller,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            ocr,
            poller,
            output_dir,
            job_timeout: None,
        }
    }

    /// Abandon jobs that are still running after `timeout`.
    pub fn with_job_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.job_timeout = timeout;
        self
    }

    /// Process every PDF in `container`.
    ///
    /// Only problems with the output directory or with listing the container
    /// make this fail. Per-document problems are counted in the summary.
    #[instrument(level = "debug", skip(self, ui))]
    pub async fn run(&self, ui: &Ui, container: &str) -> Result<BatchSummary> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| {
                format!(
                    "failed to create output directory {}",
                    self.output_dir.display()
                )
            })?;

        // The document list is fixed for the whole run.
        let documents = list_pdf_documents(self.store.as_ref(), container).await?;
        let mut summary = BatchSummary {
            found: documents.len(),
            ..BatchSummary::default()
        };
        if documents.is_empty() {
            warn!(bucket = container, "No PDF files found in the bucket");
            return Ok(summary);
        }
        info!("Found {} PDF files to process", documents.len());

        let pb = ui.new_progress_bar(
            &ProgressConfig {
                emoji: "📑",
                msg: "Processing CVs",
                done_msg: "Processed CVs",
            },
            documents.len() as u64,
        );
        for document in &documents {
            match self.process_document(&pb, document).await {
                Ok(path) => {
                    info!(key = %document.key, "Saved: {}", path.display());
                    summary.saved += 1;
                }
                Err(err) => {
                    error!(key = %document.key, "Skipping document: {err}");
                    summary.failed += 1;
                }
            }
            pb.inc(1);
        }
        pb.finish_using_style();

        info!(
            found = summary.found,
            saved = summary.saved,
            failed = summary.failed,
            "Batch complete"
        );
        Ok(summary)
    }

    /// Process a single document. Returns the path written.
    #[instrument(level = "debug", skip_all, fields(key = %document.key))]
    async fn process_document(
        &self,
        pb: &ProgressBar,
        document: &DocumentRef,
    ) -> Result<PathBuf, DocumentError> {
        info!("Processing: {}", document.key);
        pb.set_message(document.key.clone());

        let job = self.ocr.submit(document).await?;
        info!("Job started: {job}");

        let wait = self.poller.wait(self.ocr.as_ref(), &job);
        let succeeded = match self.job_timeout {
            Some(timeout) => tokio::time::timeout(timeout, wait).await.map_err(|_| {
                DocumentError::JobTimedOut {
                    job_id: job.to_string(),
                    seconds: timeout.as_secs(),
                }
            })??,
            None => wait.await?,
        };
        if !succeeded {
            return Err(DocumentError::JobFailed {
                job_id: job.to_string(),
            });
        }

        let pages = fetch_all_pages(self.ocr.as_ref(), &job).await?;
        let text = flatten_lines(&pages);
        debug!(pages = pages.len(), chars = text.len(), "Flattened OCR text");

        let envelope = OutputEnvelope {
            filename: document.key.clone(),
            structured_data: extract_fields(&text),
        };
        write_envelope(&self.output_dir, &envelope).await
    }
}
