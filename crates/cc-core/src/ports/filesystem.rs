use std::io;
use std::path::Path;

use async_trait::async_trait;

/// Local filesystem operations the use cases need.
///
/// Modes are Unix permission bits (e.g. `0o700`).
#[async_trait]
pub trait FileSystemPort: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;

    /// Create `path` and missing parents. The leaf gets `mode` when it is
    /// created here; an existing directory is left alone.
    async fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()>;

    async fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64>;

    async fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Replace `path` with `contents` and set `mode`.
    async fn write_file(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()>;

    /// `Ok(None)` when the file does not exist.
    async fn read_to_string(&self, path: &Path) -> io::Result<Option<String>>;

    /// Append to `path`, creating it (and its parent directory) if needed.
    async fn append(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Returns whether a file was removed.
    async fn remove_file(&self, path: &Path) -> io::Result<bool>;
}
