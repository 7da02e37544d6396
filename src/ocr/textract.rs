//! OCR using AWS Textract's asynchronous text detection API.

use aws_sdk_textract::{
    error::DisplayErrorContext,
    types::{Block, BlockType, DocumentLocation, JobStatus as TextractJobStatus, S3Object},
};
use leaky_bucket::RateLimiter;

use crate::{errors::DocumentError, prelude::*, rate_limit::ApiRateLimit, storage::DocumentRef};

use super::{Detection, DetectionKind, JobHandle, JobStatus, OcrService, ResultPage};

/// OCR service wrapping `StartDocumentTextDetection` and
/// `GetDocumentTextDetection`.
pub struct TextractOcrService {
    /// AWS Textract client.
    client: aws_sdk_textract::Client,

    /// Shared by every Textract call, to stay under the account's TPS quota.
    rate_limiter: RateLimiter,
}

impl TextractOcrService {
    /// Create a new Textract service.
    pub fn new(client: aws_sdk_textract::Client, rate_limit: ApiRateLimit) -> Self {
        debug!(%rate_limit, "Creating Textract service");
        Self {
            client,
            rate_limiter: rate_limit.to_rate_limiter(),
        }
    }
}

#[async_trait]
impl OcrService for TextractOcrService {
    #[instrument(level = "debug", skip_all, fields(key = %document.key))]
    async fn submit(&self, document: &DocumentRef) -> Result<JobHandle, DocumentError> {
        self.rate_limiter.acquire_one().await;
        let submission_error = |message: String| DocumentError::Submission {
            key: document.key.clone(),
            message,
        };

        let location = DocumentLocation::builder()
            .s3_object(
                S3Object::builder()
                    .bucket(&document.container)
                    .name(&document.key)
                    .build(),
            )
            .build();
        let response = self
            .client
            .start_document_text_detection()
            .document_location(location)
            .send()
            .await
            .map_err(|e| submission_error(DisplayErrorContext(e).to_string()))?;

        let job_id = response
            .job_id()
            .ok_or_else(|| submission_error("Textract returned no job ID".to_owned()))?;
        Ok(JobHandle::new(job_id))
    }

    #[instrument(level = "trace", skip_all, fields(job = %job))]
    async fn job_status(&self, job: &JobHandle) -> Result<JobStatus, DocumentError> {
        self.rate_limiter.acquire_one().await;
        let status_error = |message: String| DocumentError::Status {
            job_id: job.to_string(),
            message,
        };

        // We only want the status, so ask for as few blocks as possible.
        let response = self
            .client
            .get_document_text_detection()
            .job_id(job.as_str())
            .max_results(1)
            .send()
            .await
            .map_err(|e| status_error(DisplayErrorContext(e).to_string()))?;

        let raw = response
            .job_status()
            .ok_or_else(|| status_error("Textract returned no job status".to_owned()))?;
        let status = status_from_textract(raw)
            .ok_or_else(|| status_error(format!("unexpected job status {raw:?}")))?;
        if status == JobStatus::Failed
            && let Some(message) = response.status_message()
        {
            warn!(%job, status_message = message, "Textract reported a failure");
        }
        Ok(status)
    }

    #[instrument(level = "debug", skip_all, fields(job = %job))]
    async fn fetch_page(
        &self,
        job: &JobHandle,
        token: Option<&str>,
    ) -> Result<ResultPage, DocumentError> {
        self.rate_limiter.acquire_one().await;
        let response = self
            .client
            .get_document_text_detection()
            .job_id(job.as_str())
            .set_next_token(token.map(str::to_owned))
            .send()
            .await
            .map_err(|e| DocumentError::Aggregation {
                job_id: job.to_string(),
                page_index: 0,
                message: DisplayErrorContext(e).to_string(),
            })?;
        trace!("GetDocumentTextDetection response: {response:#?}");

        Ok(ResultPage {
            detections: response.blocks().iter().map(detection_from_block).collect(),
            next_token: response.next_token().map(str::to_owned),
        })
    }
}

/// Map a Textract job status onto ours.
///
/// `PARTIAL_SUCCESS` counts as success, because the results of the pages that
/// worked can still be fetched.
fn status_from_textract(status: &TextractJobStatus) -> Option<JobStatus> {
    match status {
        TextractJobStatus::InProgress => Some(JobStatus::Running),
        TextractJobStatus::Succeeded | TextractJobStatus::PartialSuccess => {
            Some(JobStatus::Succeeded)
        }
        TextractJobStatus::Failed => Some(JobStatus::Failed),
        _ => None,
    }
}

/// Convert a Textract block to a [`Detection`].
fn detection_from_block(block: &Block) -> Detection {
    let kind = match block.block_type() {
        Some(BlockType::Line) => DetectionKind::Line,
        Some(BlockType::Word) => DetectionKind::Word,
        _ => DetectionKind::Other,
    };
    Detection {
        kind,
        text: block.text().map(str::to_owned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_textract_statuses() {
        let cases = [
            (TextractJobStatus::InProgress, Some(JobStatus::Running)),
            (TextractJobStatus::Succeeded, Some(JobStatus::Succeeded)),
            (TextractJobStatus::PartialSuccess, Some(JobStatus::Succeeded)),
            (TextractJobStatus::Failed, Some(JobStatus::Failed)),
            (TextractJobStatus::from("SOMETHING_NEW"), None),
        ];
        for (raw, expected) in cases {
            assert_eq!(status_from_textract(&raw), expected, "{raw:?}");
        }
    }

    #[test]
    fn converts_blocks_to_detections() {
        let line = Block::builder()
            .block_type(BlockType::Line)
            .text("Jane Doe")
            .build();
        assert_eq!(detection_from_block(&line), Detection::line("Jane Doe"));

        let word = Block::builder()
            .block_type(BlockType::Word)
            .text("Jane")
            .build();
        assert_eq!(detection_from_block(&word), Detection::word("Jane"));

        let page = Block::builder().block_type(BlockType::Page).build();
        assert_eq!(
            detection_from_block(&page),
            Detection {
                kind: DetectionKind::Other,
                text: None,
            }
        );
    }
}
