//! AWS clients shared by the S3 lister and the Textract service.

use aws_config::BehaviorVersion;

use crate::prelude::*;

/// The pair of AWS clients a batch run needs.
///
/// Both clients come from the same [`aws_config::SdkConfig`], so a bucket and
/// the Textract jobs reading from it always resolve to the same region and
/// credentials.
#[derive(Clone, Debug)]
pub struct AwsClients {
    /// Used to list the documents in the source bucket.
    pub s3: aws_sdk_s3::Client,
    /// Used to run asynchronous text detection jobs.
    pub textract: aws_sdk_textract::Client,
}

impl AwsClients {
    /// Load the user's AWS configuration using standard conventions
    /// (environment variables, `~/.aws/config`, instance profiles) and build
    /// our clients.
    #[instrument(level = "debug")]
    pub async fn from_env() -> Result<Self> {
        let config = aws_config::load_defaults(BehaviorVersion::v2025_01_17()).await;
        match config.region() {
            Some(region) => debug!(%region, "Loaded AWS configuration"),
            None => warn!("No AWS region configured; requests will probably fail"),
        }
        Ok(Self {
            s3: aws_sdk_s3::Client::new(&config),
            textract: aws_sdk_textract::Client::new(&config),
        })
    }
}
