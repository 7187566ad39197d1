use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use cc_core::ports::{CommandRunnerPort, CommandSpec, FileSystemPort};
use cc_core::{Milestone, ProvisionError, ProvisioningContext};
use tracing::{info, warn};

use crate::step::ProvisioningStep;
use crate::steps::artifacts::UnpackArtifacts;

/// Installer scripts shipped in the CLI archives, relative to the working dir.
pub const CLI_INSTALLERS: [&str; 2] = [
    "cyclecloud-cli-installer/install.sh",
    "pogo-cli-installer/install.sh",
];

/// Runs the bundled server installer without starting the daemon.
pub struct InstallServer {
    runner: Arc<dyn CommandRunnerPort>,
    fs: Arc<dyn FileSystemPort>,
}

impl InstallServer {
    pub const NAME: &'static str = "install-server";

    pub fn new(runner: Arc<dyn CommandRunnerPort>, fs: Arc<dyn FileSystemPort>) -> Self {
        Self { runner, fs }
    }
}

#[async_trait]
impl ProvisioningStep for InstallServer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn milestone(&self) -> Option<Milestone> {
        Some(Milestone::Installed)
    }

    fn requires(&self) -> &'static [&'static str] {
        &[UnpackArtifacts::NAME]
    }

    async fn is_satisfied(&self, ctx: &ProvisioningContext) -> bool {
        self.fs.exists(&ctx.layout().server_binary()).await
    }

    async fn run(&self, ctx: &ProvisioningContext) -> Result<(), ProvisionError> {
        let installer = ctx.working_dir().join("cycle_server").join("install.sh");
        let spec = CommandSpec::from_path(&installer)
            .arg("--nostart")
            .current_dir(ctx.working_dir());
        self.runner.run(&spec).await?;
        info!(root = %ctx.layout().install_root.display(), "Installed server");
        Ok(())
    }
}

/// Runs the admin and storage CLI installers found in the working dir.
pub struct InstallCliTools {
    runner: Arc<dyn CommandRunnerPort>,
    fs: Arc<dyn FileSystemPort>,
}

impl InstallCliTools {
    pub const NAME: &'static str = "install-cli-tools";

    pub fn new(runner: Arc<dyn CommandRunnerPort>, fs: Arc<dyn FileSystemPort>) -> Self {
        Self { runner, fs }
    }

    async fn present(&self, ctx: &ProvisioningContext) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for rel in CLI_INSTALLERS {
            let path = ctx.working_dir().join(rel);
            if self.fs.exists(&path).await {
                found.push(path);
            }
        }
        found
    }
}

#[async_trait]
impl ProvisioningStep for InstallCliTools {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn requires(&self) -> &'static [&'static str] {
        &[UnpackArtifacts::NAME]
    }

    /// Nothing to do when the archives carried no installer.
    async fn is_satisfied(&self, ctx: &ProvisioningContext) -> bool {
        self.present(ctx).await.is_empty()
    }

    async fn run(&self, ctx: &ProvisioningContext) -> Result<(), ProvisionError> {
        for installer in self.present(ctx).await {
            let Some(dir) = installer.parent() else {
                warn!(path = %installer.display(), "Installer has no parent directory, skipping");
                continue;
            };
            let spec = CommandSpec::from_path(&installer).current_dir(dir);
            self.runner.run(&spec).await?;
            info!(installer = %installer.display(), "Installed CLI");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cc_infra::LocalFileSystem;
    use cc_platform::RecordingCommandRunner;

    use super::*;
    use crate::steps::testing::context;

    #[tokio::test]
    async fn server_install_runs_without_starting() {
        let (_dir, ctx) = context();
        let runner = Arc::new(RecordingCommandRunner::new());
        let step = InstallServer::new(runner.clone(), Arc::new(LocalFileSystem::new()));

        assert!(!step.is_satisfied(&ctx).await);
        step.run(&ctx).await.unwrap();

        let call = &runner.calls()[0];
        assert_eq!(
            runner.commands()[0],
            format!("{}/cycle_server/install.sh --nostart", ctx.working_dir().display())
        );
        assert_eq!(call.working_dir(), Some(ctx.working_dir()));
    }

    #[tokio::test]
    async fn existing_server_binary_satisfies_install() {
        let (_dir, ctx) = context();
        let binary = ctx.layout().server_binary();
        std::fs::create_dir_all(binary.parent().unwrap()).unwrap();
        std::fs::write(&binary, b"#!/bin/sh\n").unwrap();
        let step = InstallServer::new(
            Arc::new(RecordingCommandRunner::new()),
            Arc::new(LocalFileSystem::new()),
        );

        assert!(step.is_satisfied(&ctx).await);
    }

    #[tokio::test]
    async fn cli_installers_run_only_when_present() {
        let (_dir, ctx) = context();
        let runner = Arc::new(RecordingCommandRunner::new());
        let step = InstallCliTools::new(runner.clone(), Arc::new(LocalFileSystem::new()));
        assert!(step.is_satisfied(&ctx).await);

        let cli = ctx.working_dir().join(CLI_INSTALLERS[0]);
        std::fs::create_dir_all(cli.parent().unwrap()).unwrap();
        std::fs::write(&cli, b"#!/bin/sh\n").unwrap();

        assert!(!step.is_satisfied(&ctx).await);
        step.run(&ctx).await.unwrap();

        assert_eq!(runner.commands(), vec![cli.display().to_string()]);
        assert_eq!(runner.calls()[0].working_dir(), cli.parent());
    }
}
