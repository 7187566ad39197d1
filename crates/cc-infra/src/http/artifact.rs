use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use cc_core::ports::{ArtifactFetcherPort, FetchError};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Streams release artifacts and license files to disk.
pub struct ReqwestArtifactFetcher {
    client: reqwest::Client,
}

impl ReqwestArtifactFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Request {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArtifactFetcherPort for ReqwestArtifactFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let request_err = |e: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let write_err = |source| FetchError::Write {
            path: dest.to_path_buf(),
            source,
        };

        debug!(url = %url, dest = %dest.display(), "Downloading");
        let mut response = self.client.get(url).send().await.map_err(request_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Staged next to `dest`, renamed over it only once the body is complete.
        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir).map_err(write_err)?;
        let mut file = tokio::fs::File::from_std(temp.reopen().map_err(write_err)?);
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await.map_err(request_err)? {
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        temp.persist(dest).map_err(|e| write_err(e.error))?;

        info!(url = %url, dest = %dest.display(), bytes = written, "Downloaded");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn streams_body_to_destination() {
        let mut server = Server::new_async().await;
        let body = vec![7u8; 64 * 1024];
        let mock = server
            .mock("GET", "/cycle_server-all-linux64.tar.gz")
            .with_status(200)
            .with_body(body.clone())
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("cycle_server-all-linux64.tar.gz");

        let fetcher = ReqwestArtifactFetcher::new(Duration::from_secs(5)).unwrap();
        let url = format!("{}/cycle_server-all-linux64.tar.gz", server.url());
        let written = fetcher.fetch(&url, &dest).await.unwrap();

        mock.assert_async().await;
        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn http_error_does_not_create_file() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/license.dat")
            .with_status(404)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("license.dat");

        let fetcher = ReqwestArtifactFetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher
            .fetch(&format!("{}/license.dat", server.url()), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert!(!dest.exists());
    }

    /// Serves one response that promises more bytes than it sends, then hangs up.
    async fn serve_truncated_body() -> String {
        use tokio::io::AsyncReadExt;

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
    async fn interrupted_body_leaves_no_file_behind() {
        let url = serve_truncated_body().await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("license.dat");

        let fetcher = ReqwestArtifactFetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher.fetch(&url, &dest).await.unwrap_err();

        assert!(matches!(err, FetchError::Request { .. }));
        assert!(!dest.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn interrupted_body_keeps_the_previous_file() {
        let url = serve_truncated_body().await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("license.dat");
        std::fs::write(&dest, b"old license").unwrap();

        let fetcher = ReqwestArtifactFetcher::new(Duration::from_secs(5)).unwrap();
        assert!(fetcher.fetch(&url, &dest).await.is_err());

        assert_eq!(std::fs::read(&dest).unwrap(), b"old license");
    }
}
