use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("writing {path} failed: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Downloads a URL to a local file.
#[async_trait]
pub trait ArtifactFetcherPort: Send + Sync {
    /// Stream `url` into `dest`, replacing any existing file once the whole
    /// body has arrived. On error `dest` is left as it was. Returns the byte count.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}
