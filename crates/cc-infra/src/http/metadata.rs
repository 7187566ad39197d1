use std::time::Duration;

use async_trait::async_trait;
use cc_core::account::InstanceMetadata;
use cc_core::ports::{MetadataError, MetadataPort};
use tracing::{debug, info};

/// Instance metadata service client. The service only answers requests that
/// carry `Metadata: true`.
pub struct ImdsMetadataClient {
    client: reqwest::Client,
    url: String,
}

impl ImdsMetadataClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, MetadataError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| MetadataError::Unreachable(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl MetadataPort for ImdsMetadataClient {
    async fn fetch(&self) -> Result<InstanceMetadata, MetadataError> {
        debug!(url = %self.url, "Querying instance metadata");
        let response = self
            .client
            .get(&self.url)
            .header("Metadata", "true")
            .send()
            .await
            .map_err(|e| MetadataError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MetadataError::Unreachable(e.to_string()))?;
        let metadata: InstanceMetadata =
            serde_json::from_str(&body).map_err(|e| MetadataError::Malformed(e.to_string()))?;

        info!(
            subscription_id = %metadata.subscription_id(),
            location = %metadata.location(),
            resource_group = %metadata.resource_group(),
            "Fetched instance metadata"
        );
        Ok(metadata)
    }
}
