use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::PatchRules;

/// Atomic rewrite failed. The target file is untouched in every case.
#[derive(Debug, Error)]
pub enum ConfigWriteError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot create temporary file in {dir}: {source}")]
    TempFile {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write temporary file for {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot copy ownership/mode of {path} to temporary file: {source}")]
    Permissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot replace {path}: {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a patch did to the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub replaced: usize,
    /// Rule keys the file has no line for. They are left out, not added.
    pub missing: Vec<String>,
}

/// Applies [`PatchRules`] to a properties file atomically.
pub trait PropertiesPatchPort: Send + Sync {
    fn apply(&self, path: &Path, rules: &PatchRules) -> Result<PatchOutcome, ConfigWriteError>;
}
