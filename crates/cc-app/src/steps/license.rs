use std::sync::Arc;

use async_trait::async_trait;
use cc_core::ports::{ArtifactFetcherPort, FileSystemPort, OwnershipPort};
use cc_core::{ProvisionError, ProvisioningContext};
use tracing::info;

use crate::step::ProvisioningStep;
use crate::steps::install::InstallServer;

/// Downloads the trial license next to the server. Planned only when a
/// license URL was supplied.
pub struct FetchLicense {
    fetcher: Arc<dyn ArtifactFetcherPort>,
    fs: Arc<dyn FileSystemPort>,
    ownership: Arc<dyn OwnershipPort>,
}

impl FetchLicense {
    pub const NAME: &'static str = "fetch-license";

    pub fn new(
        fetcher: Arc<dyn ArtifactFetcherPort>,
        fs: Arc<dyn FileSystemPort>,
        ownership: Arc<dyn OwnershipPort>,
    ) -> Self {
        Self {
            fetcher,
            fs,
            ownership,
        }
    }
}

#[async_trait]
impl ProvisioningStep for FetchLicense {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn requires(&self) -> &'static [&'static str] {
        &[InstallServer::NAME]
    }

    async fn is_satisfied(&self, ctx: &ProvisioningContext) -> bool {
        ctx.license_url().is_none() || self.fs.exists(&ctx.layout().license_file()).await
    }

    async fn run(&self, ctx: &ProvisioningContext) -> Result<(), ProvisionError> {
        let Some(url) = ctx.license_url() else {
            return Ok(());
        };
        let license = ctx.layout().license_file();
        self.fetcher.fetch(url, &license).await?;
        self.ownership
            .assign(&license, false)
            .await
            .map_err(|e| ProvisionError::Permission {
                path: license.clone(),
                reason: e.to_string(),
            })?;
        info!(path = %license.display(), "Fetched license");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use cc_core::ports::FetchError;
    use cc_infra::{LocalFileSystem, ReqwestArtifactFetcher};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use cc_platform::{RecordingCommandRunner, ServiceOwnership};

    use super::*;
    use crate::steps::testing::context_with_license;

    struct WritingFetcher;

    #[async_trait]
    impl ArtifactFetcherPort for WritingFetcher {
        async fn fetch(&self, _url: &str, dest: &Path) -> Result<u64, FetchError> {
            std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
            std::fs::write(dest, b"license").unwrap();
            Ok(7)
        }
    }

    #[tokio::test]
    async fn fetches_license_and_hands_it_to_the_service_account() {
        let (_dir, ctx) = context_with_license("https://example.test/license.dat");
        let runner = Arc::new(RecordingCommandRunner::new());
        let step = FetchLicense::new(
            Arc::new(WritingFetcher),
            Arc::new(LocalFileSystem::new()),
            Arc::new(ServiceOwnership::new(runner.clone(), "cycle_server:")),
        );

        assert!(!step.is_satisfied(&ctx).await);
        step.run(&ctx).await.unwrap();

        let license = ctx.layout().license_file();
        assert_eq!(std::fs::read(&license).unwrap(), b"license");
        assert_eq!(
            runner.commands(),
            vec![format!("chown cycle_server: {}", license.display())]
        );
        assert!(step.is_satisfied(&ctx).await);
    }

    #[tokio::test]
    async fn chown_failure_is_a_permission_error() {
        let (_dir, ctx) = context_with_license("https://example.test/license.dat");
        let runner = Arc::new(RecordingCommandRunner::new());
        runner.fail("chown", 1);
        let step = FetchLicense::new(
            Arc::new(WritingFetcher),
            Arc::new(LocalFileSystem::new()),
            Arc::new(ServiceOwnership::new(runner, "cycle_server:")),
        );

        let err = step.run(&ctx).await.unwrap_err();

        assert!(matches!(err, ProvisionError::Permission { .. }));
    }

    /// One response with a short body: `Content-Length` promises more than is sent.
    async fn serve_truncated_license() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\npartial")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/license.dat")
    }

    #[tokio::test]
    async fn interrupted_download_is_retried_on_the_next_run() {
        let url = serve_truncated_license().await;
        let (_dir, ctx) = context_with_license(&url);
        let license = ctx.layout().license_file();
        std::fs::create_dir_all(license.parent().unwrap()).unwrap();
        let runner = Arc::new(RecordingCommandRunner::new());
        let step = FetchLicense::new(
            Arc::new(ReqwestArtifactFetcher::new(Duration::from_secs(5)).unwrap()),
            Arc::new(LocalFileSystem::new()),
            Arc::new(ServiceOwnership::new(runner.clone(), "cycle_server:")),
        );

        let err = step.run(&ctx).await.unwrap_err();

        assert!(matches!(err, ProvisionError::Download(_)), "{err:?}");
        assert!(!license.exists());
        assert!(!step.is_satisfied(&ctx).await);
        assert!(!runner.invoked("chown"));
    }
}
