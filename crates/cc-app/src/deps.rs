//! Port grouping handed to the orchestrator.
//!
//! Plain parameter grouping. No defaults and no construction logic; the
//! binary's wiring decides which adapter backs each port.

use std::sync::Arc;

use cc_core::ports::{
    ArtifactFetcherPort, CommandRunnerPort, FileSystemPort, MetadataPort, OwnershipPort,
    PropertiesPatchPort,
};

pub struct ProvisioningDeps {
    pub runner: Arc<dyn CommandRunnerPort>,
    pub fs: Arc<dyn FileSystemPort>,
    pub patcher: Arc<dyn PropertiesPatchPort>,
    pub fetcher: Arc<dyn ArtifactFetcherPort>,
    pub metadata: Arc<dyn MetadataPort>,
    pub ownership: Arc<dyn OwnershipPort>,
}
