use std::fs::Permissions;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use async_trait::async_trait;
use cc_core::ports::FileSystemPort;
use tempfile::NamedTempFile;
use tokio::fs::{self, DirBuilder, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Directory mode for parents created implicitly by [`FileSystemPort::append`].
const PARENT_DIR_MODE: u32 = 0o755;

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSystemPort for LocalFileSystem {
    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        if fs::metadata(path).await.is_ok_and(|m| m.is_dir()) {
            return Ok(());
        }
        DirBuilder::new().recursive(true).mode(mode).create(path).await?;
        // The builder's mode is filtered through the umask.
        fs::set_permissions(path, Permissions::from_mode(mode)).await
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64> {
        fs::copy(from, to).await
    }

    async fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        fs::set_permissions(path, Permissions::from_mode(mode)).await
    }

    async fn write_file(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir)?;
        let mut file = fs::File::from_std(temp.reopen()?);
        file.write_all(contents).await?;
        file.set_permissions(Permissions::from_mode(mode)).await?;
        file.sync_all().await?;
        drop(file);
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<Option<String>> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn append(&self, path: &Path, contents: &str) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.create_dir_all(parent, PARENT_DIR_MODE).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .mode(0o600)
            .open(path)
            .await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn mode_of(path: &Path) -> u32 {
        fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[tokio::test]
    async fn create_dir_all_applies_mode_and_leaves_existing_dirs_alone() {
        let dir = tempfile::tempdir().unwrap();
        let ssh = dir.path().join("home").join(".ssh");
        let local = LocalFileSystem::new();

        local.create_dir_all(&ssh, 0o700).await.unwrap();
        assert_eq!(mode_of(&ssh), 0o700);

        fs::set_permissions(&ssh, Permissions::from_mode(0o750)).unwrap();
        local.create_dir_all(&ssh, 0o700).await.unwrap();
        assert_eq!(mode_of(&ssh), 0o750);
    }

    #[tokio::test]
    async fn write_file_replaces_content_with_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("account.json");
        let local = LocalFileSystem::new();

        local.write_file(&path, b"old", 0o644).await.unwrap();
        local.write_file(&path, b"{}", 0o600).await.unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"{}");
        assert_eq!(mode_of(&path), 0o600);
    }

    #[tokio::test]
    async fn read_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalFileSystem::new();
        assert_eq!(local.read_to_string(&dir.path().join("nope")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn append_creates_parent_and_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".cycle").join("pogo.ini");
        let local = LocalFileSystem::new();

        local.append(&path, "[a]\n").await.unwrap();
        local.append(&path, "[b]\n").await.unwrap();

        assert_eq!(local.read_to_string(&path).await.unwrap().unwrap(), "[a]\n[b]\n");
        assert_eq!(mode_of(&path), 0o600);
    }

    #[tokio::test]
    async fn remove_file_reports_whether_anything_was_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".keystore");
        let local = LocalFileSystem::new();

        assert!(!local.remove_file(&path).await.unwrap());
        fs::write(&path, b"x").unwrap();
        assert!(local.remove_file(&path).await.unwrap());
        assert!(!local.exists(&path).await);
    }
}
