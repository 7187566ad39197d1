use std::sync::Arc;

use async_trait::async_trait;
use cc_core::config::server_patch_rules;
use cc_core::ports::PropertiesPatchPort;
use cc_core::{Milestone, ProvisionError, ProvisioningContext};
use tracing::{info, warn};

use crate::step::ProvisioningStep;
use crate::steps::install::InstallServer;
use crate::tls::{TlsCertProvisioner, DEFAULT_DNAME};

/// Issues the HTTPS keystore and points the server properties at it.
///
/// Always runs: the keystore password is generated per run, so keystore and
/// properties have to be rewritten together.
pub struct ConfigureServer {
    tls: TlsCertProvisioner,
    patcher: Arc<dyn PropertiesPatchPort>,
}

impl ConfigureServer {
    pub const NAME: &'static str = "configure-server";

    pub fn new(tls: TlsCertProvisioner, patcher: Arc<dyn PropertiesPatchPort>) -> Self {
        Self { tls, patcher }
    }
}

#[async_trait]
impl ProvisioningStep for ConfigureServer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn milestone(&self) -> Option<Milestone> {
        Some(Milestone::Configured)
    }

    fn requires(&self) -> &'static [&'static str] {
        &[InstallServer::NAME]
    }

    async fn is_satisfied(&self, _ctx: &ProvisioningContext) -> bool {
        false
    }

    async fn run(&self, ctx: &ProvisioningContext) -> Result<(), ProvisionError> {
        let layout = ctx.layout();
        self.tls
            .issue_self_signed(&layout.keystore(), ctx.keystore_password(), DEFAULT_DNAME)
            .await?;

        let properties = layout.properties_file();
        let outcome = self
            .patcher
            .apply(&properties, &server_patch_rules(ctx.keystore_password()))?;
        info!(
            path = %properties.display(),
            replaced = outcome.replaced,
            "Patched server properties"
        );
        if !outcome.missing.is_empty() {
            warn!(
                path = %properties.display(),
                keys = ?outcome.missing,
                "Server properties have no line for these keys, left unset"
            );
        }
        Ok(())
    }
}
