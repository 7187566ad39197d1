//! Atomic in-place rewrite of the server properties file.
//!
//! The patched content is written to a temporary file in the target's own
//! directory (same filesystem), given the original's mode and owner, flushed
//! to disk and then renamed over the target. Readers see either the old file
//! or the new one, never a partial write.

use std::fs::{self, Permissions};
use std::io::Write;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use cc_core::config::PatchRules;
use cc_core::ports::{ConfigWriteError, PatchOutcome, PropertiesPatchPort};
use tempfile::NamedTempFile;
use tracing::{debug, info};

#[derive(Debug, Default, Clone, Copy)]
pub struct PropertiesFilePatcher;

impl PropertiesFilePatcher {
    pub fn new() -> Self {
        Self
    }

    /// Write the patched content next to `path` without touching `path`.
    pub fn stage(&self, path: &Path, rules: &PatchRules) -> Result<StagedRewrite, ConfigWriteError> {
        let read_err = |source| ConfigWriteError::Read {
            path: path.to_path_buf(),
            source,
        };
        let original = fs::read_to_string(path).map_err(read_err)?;
        let metadata = fs::metadata(path).map_err(read_err)?;

        let patched = rules.rewrite(&original);

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir).map_err(|source| ConfigWriteError::TempFile {
            dir: dir.to_path_buf(),
            source,
        })?;

        let write_err = |source| ConfigWriteError::Write {
            path: path.to_path_buf(),
            source,
        };
        temp.write_all(patched.content.as_bytes()).map_err(write_err)?;

        let perm_err = |source| ConfigWriteError::Permissions {
            path: path.to_path_buf(),
            source,
        };
        let file = temp.as_file();
        file.set_permissions(Permissions::from_mode(metadata.mode() & 0o7777))
            .map_err(perm_err)?;
        let temp_meta = file.metadata().map_err(perm_err)?;
        if temp_meta.uid() != metadata.uid() || temp_meta.gid() != metadata.gid() {
            std::os::unix::fs::fchown(file, Some(metadata.uid()), Some(metadata.gid()))
                .map_err(perm_err)?;
        }

        file.sync_all().map_err(write_err)?;

        debug!(
            target_file = %path.display(),
            temp_file = %temp.path().display(),
            "Staged properties rewrite"
        );

        Ok(StagedRewrite {
            temp,
            target: path.to_path_buf(),
            outcome: PatchOutcome {
                replaced: patched.replaced,
                missing: patched.missing,
            },
        })
    }
}

impl PropertiesPatchPort for PropertiesFilePatcher {
    fn apply(&self, path: &Path, rules: &PatchRules) -> Result<PatchOutcome, ConfigWriteError> {
        self.stage(path, rules)?.commit()
    }
}

/// A fully written replacement that has not yet been renamed into place.
///
/// Dropping it without calling [`StagedRewrite::commit`] removes the
/// temporary file and leaves the target unchanged.
#[derive(Debug)]
pub struct StagedRewrite {
    temp: NamedTempFile,
    target: PathBuf,
    outcome: PatchOutcome,
}

impl StagedRewrite {
    pub fn outcome(&self) -> &PatchOutcome {
        &self.outcome
    }

    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    pub fn commit(self) -> Result<PatchOutcome, ConfigWriteError> {
        let StagedRewrite {
            temp,
            target,
            outcome,
        } = self;

        temp.persist(&target)
            .map_err(|e| ConfigWriteError::Replace {
                path: target.clone(),
                source: e.error,
            })?;

        // Make the rename itself durable.
        if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
            if let Ok(handle) = fs::File::open(dir) {
                let _ = handle.sync_all();
            }
        }

        info!(
            path = %target.display(),
            replaced = outcome.replaced,
            missing = ?outcome.missing,
            "Rewrote properties file"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_core::config::{server_patch_rules, PatchRule};
    use cc_core::SecretString;

    fn rules() -> PatchRules {
        PatchRules::new().with_rule(PatchRule::new("webServerPort", "80"))
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn apply_replaces_matching_lines_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cycle_server.properties");
        fs::write(&path, "webServerPort=8080\nfoo=bar\n").unwrap();

        let outcome = PropertiesFilePatcher::new().apply(&path, &rules()).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "webServerPort=80\nfoo=bar\n");
        assert_eq!(outcome.replaced, 1);
        assert!(outcome.missing.is_empty());
        assert_eq!(entries(dir.path()), vec!["cycle_server.properties"]);
    }

    #[test]
    fn second_application_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cycle_server.properties");
        fs::write(
            &path,
            "# comment\r\nwebServerMaxHeapSize=1024M\r\nwebServerPort=8080\r\nother=1",
        )
        .unwrap();
        let rules = server_patch_rules(&SecretString::new("pw".to_string()));
        let patcher = PropertiesFilePatcher::new();

        patcher.apply(&path, &rules).unwrap();
        let first = fs::read(&path).unwrap();
        patcher.apply(&path, &rules).unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn uncommitted_stage_leaves_original_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cycle_server.properties");
        fs::write(&path, "webServerPort=8080\n").unwrap();

        let staged = PropertiesFilePatcher::new().stage(&path, &rules()).unwrap();
        assert!(staged.temp_path().starts_with(dir.path()));
        assert_eq!(
            fs::read_to_string(staged.temp_path()).unwrap(),
            "webServerPort=80\n"
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "webServerPort=8080\n");

        drop(staged);
        assert_eq!(fs::read_to_string(&path).unwrap(), "webServerPort=8080\n");
        assert_eq!(entries(dir.path()), vec!["cycle_server.properties"]);
    }

    #[test]
    fn mode_is_preserved_across_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cycle_server.properties");
        fs::write(&path, "webServerPort=8080\n").unwrap();
        fs::set_permissions(&path, Permissions::from_mode(0o640)).unwrap();

        PropertiesFilePatcher::new().apply(&path, &rules()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    fn missing_target_is_a_read_error_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.properties");

        let err = PropertiesFilePatcher::new().apply(&path, &rules()).unwrap_err();

        assert!(matches!(err, ConfigWriteError::Read { .. }));
        assert!(entries(dir.path()).is_empty());
    }
}
