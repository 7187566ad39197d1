use async_trait::async_trait;
use thiserror::Error;

use crate::account::InstanceMetadata;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("metadata endpoint returned status {0}")]
    Status(u16),

    #[error("metadata response malformed: {0}")]
    Malformed(String),
}

/// Cloud instance metadata service.
#[async_trait]
pub trait MetadataPort: Send + Sync {
    /// Facts about the VM this process runs on. No fallback on failure.
    async fn fetch(&self) -> Result<InstanceMetadata, MetadataError>;
}

#[cfg(any(test, feature = "test-utils"))]
mockall::mock! {
    pub Metadata {}

    #[async_trait]
    impl MetadataPort for Metadata {
        async fn fetch(&self) -> Result<InstanceMetadata, MetadataError>;
    }
}
