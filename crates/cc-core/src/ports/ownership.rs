use std::path::Path;

use async_trait::async_trait;

use super::CommandError;

/// Hands files to the account the server runs as.
#[async_trait]
pub trait OwnershipPort: Send + Sync {
    /// Owner spec as given to `chown`, e.g. `cycle_server:`.
    fn owner(&self) -> &str;

    /// `recursive` descends into directories.
    async fn assign(&self, path: &Path, recursive: bool) -> Result<(), CommandError>;
}
