use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cc_core::ports::{ArtifactFetcherPort, CommandRunnerPort, CommandSpec, FileSystemPort};
use cc_core::{Milestone, ProvisionError, ProvisioningContext};
use tracing::info;

use crate::step::ProvisioningStep;

/// Release archives, in download and extraction order.
pub const ARCHIVES: [&str; 3] = [
    "cycle_server-all-linux64.tar.gz",
    "cyclecloud-cli.linux64.tar.gz",
    "pogo-cli.linux64.tar.gz",
];

fn archive_paths(working_dir: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    ARCHIVES.iter().map(move |name| working_dir.join(name))
}

/// Joins `name` onto the release base URL with exactly one separator.
fn artifact_url(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name.trim_start_matches('/'))
}

pub struct DownloadArtifacts {
    fetcher: Arc<dyn ArtifactFetcherPort>,
    fs: Arc<dyn FileSystemPort>,
}

impl DownloadArtifacts {
    pub const NAME: &'static str = "download-artifacts";

    pub fn new(fetcher: Arc<dyn ArtifactFetcherPort>, fs: Arc<dyn FileSystemPort>) -> Self {
        Self { fetcher, fs }
    }
}

#[async_trait]
impl ProvisioningStep for DownloadArtifacts {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn milestone(&self) -> Option<Milestone> {
        Some(Milestone::Downloaded)
    }

    async fn is_satisfied(&self, ctx: &ProvisioningContext) -> bool {
        for archive in archive_paths(ctx.working_dir()) {
            if !self.fs.exists(&archive).await {
                return false;
            }
        }
        true
    }

    async fn run(&self, ctx: &ProvisioningContext) -> Result<(), ProvisionError> {
        for name in ARCHIVES {
            let url = artifact_url(ctx.download_url(), name);
            let dest = ctx.working_dir().join(name);
            let bytes = self.fetcher.fetch(&url, &dest).await?;
            info!(url = %url, bytes, "Downloaded artifact");
        }
        Ok(())
    }
}

pub struct UnpackArtifacts {
    runner: Arc<dyn CommandRunnerPort>,
    fs: Arc<dyn FileSystemPort>,
}

impl UnpackArtifacts {
    pub const NAME: &'static str = "unpack-artifacts";

    pub fn new(runner: Arc<dyn CommandRunnerPort>, fs: Arc<dyn FileSystemPort>) -> Self {
        Self { runner, fs }
    }
}

#[async_trait]
impl ProvisioningStep for UnpackArtifacts {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn milestone(&self) -> Option<Milestone> {
        Some(Milestone::Unpacked)
    }

    fn requires(&self) -> &'static [&'static str] {
        &[DownloadArtifacts::NAME]
    }

    /// The server installer is what later steps need from the archives.
    async fn is_satisfied(&self, ctx: &ProvisioningContext) -> bool {
        self.fs
            .exists(&ctx.working_dir().join("cycle_server").join("install.sh"))
            .await
    }

    async fn run(&self, ctx: &ProvisioningContext) -> Result<(), ProvisionError> {
        for archive in archive_paths(ctx.working_dir()) {
            let spec = CommandSpec::new("tar")
                .arg("-xzf")
                .path_arg(&archive)
                .arg("-C")
                .path_arg(ctx.working_dir());
            self.runner
                .run(&spec)
                .await
                .map_err(|source| ProvisionError::Extraction {
                    archive: archive.clone(),
                    source,
                })?;
        }
        info!(dir = %ctx.working_dir().display(), "Unpacked release archives");
        Ok(())
    }
}
