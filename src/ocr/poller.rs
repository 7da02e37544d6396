//! Waiting for OCR jobs to finish.

use std::time::Duration;

use crate::{errors::DocumentError, prelude::*};

use super::{JobHandle, JobStatus, OcrService};

/// How long we wait between status queries by default.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Polls a job at a fixed interval until it reaches a terminal status.
///
/// There is no timeout here: a job that never leaves `RUNNING` is polled
/// forever. Callers that care should wrap [`JobPoller::wait`] in
/// [`tokio::time::timeout`]. Dropping the returned future stops polling.
///
/// All sleeping goes through [`tokio::time`], so tests can drive the poller
/// with a paused clock.
#[derive(Clone, Copy, Debug)]
pub struct JobPoller {
    interval: Duration,
}

impl Default for JobPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl JobPoller {
    /// Create a poller that queries status every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Wait for `job` to finish. Returns `true` if it succeeded and `false` if
    /// it failed.
    ///
    /// We always sleep before the first query, since a freshly submitted job
    /// is never done yet.
    #[instrument(level = "debug", skip(self, ocr), fields(job = %job))]
    pub async fn wait(
        &self,
        ocr: &dyn OcrService,
        job: &JobHandle,
    ) -> Result<bool, DocumentError> {
        info!("Waiting for job {job} to complete");
        let mut last_status = None;
        loop {
            tokio::time::sleep(self.interval).await;
            let status = ocr.job_status(job).await?;
            if last_status == Some(status) {
                debug!(%status, "Job status unchanged");
            } else {
                info!(%status, "Job status changed");
                last_status = Some(status);
            }

            if status.is_terminal() {
                return Ok(status == JobStatus::Succeeded);
            }
        }
    }
}
