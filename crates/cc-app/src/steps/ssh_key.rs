use async_trait::async_trait;
use cc_core::{ProvisionError, ProvisioningContext};

use crate::ssh::SshKeyProvisioner;
use crate::step::ProvisioningStep;
use crate::steps::install::InstallServer;

pub struct EnsureSshKey {
    ssh: SshKeyProvisioner,
}

impl EnsureSshKey {
    pub const NAME: &'static str = "ensure-ssh-key";

    pub fn new(ssh: SshKeyProvisioner) -> Self {
        Self { ssh }
    }
}

#[async_trait]
impl ProvisioningStep for EnsureSshKey {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn requires(&self) -> &'static [&'static str] {
        &[InstallServer::NAME]
    }

    async fn is_satisfied(&self, ctx: &ProvisioningContext) -> bool {
        let layout = ctx.layout();
        self.ssh
            .is_provisioned(&layout.user_ssh_key(), &layout.service_ssh_dir())
            .await
    }

    async fn run(&self, ctx: &ProvisioningContext) -> Result<(), ProvisionError> {
        let layout = ctx.layout();
        self.ssh
            .ensure(&layout.user_ssh_key(), &layout.service_ssh_dir())
            .await
            .map(|_| ())
    }
}
