use async_trait::async_trait;
use cc_core::{Milestone, ProvisionError, ProvisioningContext};

use crate::server::ServerControl;
use crate::step::ProvisioningStep;
use crate::steps::configure::ConfigureServer;

pub struct StartServer {
    server: ServerControl,
}

impl StartServer {
    pub const NAME: &'static str = "start-server";

    pub fn new(server: ServerControl) -> Self {
        Self { server }
    }
}

#[async_trait]
impl ProvisioningStep for StartServer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn milestone(&self) -> Option<Milestone> {
        Some(Milestone::Started)
    }

    fn requires(&self) -> &'static [&'static str] {
        &[ConfigureServer::NAME]
    }

    /// Registration may already have brought the server up.
    async fn is_satisfied(&self, _ctx: &ProvisioningContext) -> bool {
        self.server.is_running().await
    }

    async fn run(&self, _ctx: &ProvisioningContext) -> Result<(), ProvisionError> {
        self.server.start().await?;
        self.server.await_ready().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use cc_platform::RecordingCommandRunner;

    use super::*;
    use crate::server::StartupPolicy;
    use crate::steps::testing::context;

    #[tokio::test]
    async fn starts_and_waits_for_status() {
        let (_dir, ctx) = context();
        let binary = ctx.layout().server_binary();
        let status = format!("{} status", binary.display());
        let runner = Arc::new(RecordingCommandRunner::new());
        runner.fail_once(&status, 1).fail_once(&status, 1);
        let step = StartServer::new(ServerControl::new(
            runner.clone(),
            binary.clone(),
            StartupPolicy {
                attempts: 3,
                interval: Duration::from_millis(1),
            },
        ));

        assert!(!step.is_satisfied(&ctx).await);
        step.run(&ctx).await.unwrap();

        assert_eq!(
            runner.commands(),
            vec![
                status.clone(),
                format!("{} start", binary.display()),
                status.clone(),
                status,
            ]
        );
    }
}
