//! Dependency assembly.
//!
//! The only place that depends on cc-infra, cc-platform and cc-app at once.
//! It builds adapters and hands them over as ports; it makes no decisions.

use std::sync::Arc;

use cc_app::ProvisioningDeps;
use cc_core::ports::{CommandRunnerPort, FetchError, MetadataError};
use cc_core::BootstrapConfig;
use cc_infra::{ImdsMetadataClient, LocalFileSystem, PropertiesFilePatcher, ReqwestArtifactFetcher};
use cc_platform::{ServiceOwnership, SystemCommandRunner};

pub type WiringResult<T> = Result<T, WiringError>;

#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("Artifact download client initialization failed: {0}")]
    FetcherInit(#[from] FetchError),

    #[error("Instance metadata client initialization failed: {0}")]
    MetadataInit(#[from] MetadataError),
}

pub fn wire_dependencies(config: &BootstrapConfig) -> WiringResult<ProvisioningDeps> {
    let runner: Arc<dyn CommandRunnerPort> =
        Arc::new(SystemCommandRunner::new(config.command_timeout()));
    let fetcher = ReqwestArtifactFetcher::new(config.download_timeout())?;
    let metadata = ImdsMetadataClient::new(config.metadata_url.clone(), config.metadata_timeout())?;
    let ownership = ServiceOwnership::new(runner.clone(), format!("{}:", config.service_account));

    Ok(ProvisioningDeps {
        runner,
        fs: Arc::new(LocalFileSystem::new()),
        patcher: Arc::new(PropertiesFilePatcher::new()),
        fetcher: Arc::new(fetcher),
        metadata: Arc::new(metadata),
        ownership: Arc::new(ownership),
    })
}
