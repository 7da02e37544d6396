//! Listing documents in an S3 bucket.

use aws_sdk_s3::error::DisplayErrorContext;

use crate::prelude::*;

use super::DocumentStore;

/// A [`DocumentStore`] backed by S3.
pub struct S3DocumentStore {
    client: aws_sdk_s3::Client,
}

impl S3DocumentStore {
    /// Wrap an S3 client.
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentStore for S3DocumentStore {
    #[instrument(level = "debug", skip(self))]
    async fn list_keys(&self, container: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(container)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(e)))?;
        trace!("ListObjectsV2 response: {response:#?}");

        // We deliberately stop at the first page.
        if response.is_truncated() == Some(true) {
            warn!(
                bucket = container,
                "Bucket listing is truncated; only the first page of objects will be processed"
            );
        }

        Ok(response
            .contents()
            .iter()
            .filter_map(|object| object.key())
            .map(str::to_owned)
            .collect())
    }
}
