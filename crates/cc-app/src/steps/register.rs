use async_trait::async_trait;
use cc_core::{Milestone, ProvisionError, ProvisioningContext};
use tracing::info;

use crate::registrar::CloudAccountRegistrar;
use crate::step::ProvisioningStep;
use crate::steps::configure::ConfigureServer;

/// Planned only when service principal credentials were supplied.
pub struct RegisterAccount {
    registrar: CloudAccountRegistrar,
}

impl RegisterAccount {
    pub const NAME: &'static str = "register-account";

    pub fn new(registrar: CloudAccountRegistrar) -> Self {
        Self { registrar }
    }
}

#[async_trait]
impl ProvisioningStep for RegisterAccount {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn milestone(&self) -> Option<Milestone> {
        Some(Milestone::AccountRegistered)
    }

    fn requires(&self) -> &'static [&'static str] {
        &[ConfigureServer::NAME]
    }

    async fn is_satisfied(&self, ctx: &ProvisioningContext) -> bool {
        ctx.service_principal().is_none()
    }

    async fn run(&self, ctx: &ProvisioningContext) -> Result<(), ProvisionError> {
        let summary = self.registrar.register(ctx).await?;
        info!(
            storage_account = %summary.storage_account,
            tool_config_updated = summary.tool_config_updated,
            "Account registration complete"
        );
        Ok(())
    }
}
