//! Host-wide exclusive run lock.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LockError {
    #[error("cannot open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("another bootstrap run holds {path}")]
    Held { path: PathBuf },

    #[error("flock on {path} failed: {source}")]
    Flock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Exclusive non-blocking `flock` held for the lifetime of the value.
///
/// The lock file is left in place on release; only the advisory lock matters.
#[derive(Debug)]
pub struct HostLock {
    file: File,
    path: PathBuf,
}

impl HostLock {
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LockError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|source| LockError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let ret = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if ret != 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EWOULDBLOCK) {
                return Err(LockError::Held {
                    path: path.to_path_buf(),
                });
            }
            return Err(LockError::Flock {
                path: path.to_path_buf(),
                source: err,
            });
        }

        // Owner pid for operators; failure to record it does not matter.
        let _ = file.set_len(0);
        let _ = writeln!(file, "{}", std::process::id());

        info!(path = %path.display(), "Acquired host lock");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for HostLock {
    fn drop(&mut self) {
        unsafe {
            libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
        }
        debug!(path = %self.path.display(), "Released host lock");
    }
}
