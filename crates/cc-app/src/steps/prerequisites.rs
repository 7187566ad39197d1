use std::sync::Arc;

use async_trait::async_trait;
use cc_core::ports::{CommandRunnerPort, CommandSpec};
use cc_core::{Milestone, ProvisionError, ProvisioningContext};
use tracing::info;

use crate::step::ProvisioningStep;

/// Installs the Java runtime the server needs.
pub struct InstallPrerequisites {
    runner: Arc<dyn CommandRunnerPort>,
    package_manager: String,
    package: String,
}

impl InstallPrerequisites {
    pub const NAME: &'static str = "install-prerequisites";

    pub fn new(
        runner: Arc<dyn CommandRunnerPort>,
        package_manager: impl Into<String>,
        package: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            package_manager: package_manager.into(),
            package: package.into(),
        }
    }

    /// Package database query matching the configured manager.
    fn query(&self) -> CommandSpec {
        match self.package_manager.as_str() {
            "apt" | "apt-get" => CommandSpec::new("dpkg").args(["-s", self.package.as_str()]),
            _ => CommandSpec::new("rpm").args(["-q", self.package.as_str()]),
        }
    }
}

#[async_trait]
impl ProvisioningStep for InstallPrerequisites {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn milestone(&self) -> Option<Milestone> {
        Some(Milestone::PrereqInstalled)
    }

    async fn is_satisfied(&self, _ctx: &ProvisioningContext) -> bool {
        self.runner.run(&self.query()).await.is_ok()
    }

    async fn run(&self, _ctx: &ProvisioningContext) -> Result<(), ProvisionError> {
        let install = CommandSpec::new(self.package_manager.clone())
            .args(["install", "-y", self.package.as_str()]);
        self.runner.run(&install).await?;
        info!(package = %self.package, "Installed runtime package");
        Ok(())
    }
}
