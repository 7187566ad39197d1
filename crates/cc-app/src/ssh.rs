//! SSH key pair used by the server to reach cluster nodes.
//!
//! Two independent idempotency checks: the user's key is never regenerated
//! once present, and the service-side mirror is never overwritten.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cc_core::ports::{CommandRunnerPort, CommandSpec, FileSystemPort, OwnershipPort};
use cc_core::ProvisionError;
use tracing::{info, info_span, Instrument};

const SSH_DIR_MODE: u32 = 0o700;
const PRIVATE_KEY_MODE: u32 = 0o600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SshKeyOutcome {
    pub generated: bool,
    pub mirrored: bool,
}

pub struct SshKeyProvisioner {
    runner: Arc<dyn CommandRunnerPort>,
    fs: Arc<dyn FileSystemPort>,
    ownership: Arc<dyn OwnershipPort>,
}

fn public_key_path(private_key: &Path) -> PathBuf {
    let mut name: OsString = private_key.as_os_str().to_owned();
    name.push(".pub");
    PathBuf::from(name)
}

impl SshKeyProvisioner {
    pub fn new(
        runner: Arc<dyn CommandRunnerPort>,
        fs: Arc<dyn FileSystemPort>,
        ownership: Arc<dyn OwnershipPort>,
    ) -> Self {
        Self {
            runner,
            fs,
            ownership,
        }
    }

    /// Both the user key and the service mirror exist.
    pub async fn is_provisioned(&self, user_key: &Path, service_dir: &Path) -> bool {
        self.fs.exists(user_key).await
            && self.fs.exists(&Self::mirror_path(user_key, service_dir)).await
    }

    fn mirror_path(user_key: &Path, service_dir: &Path) -> PathBuf {
        match user_key.file_name() {
            Some(name) => service_dir.join(name),
            None => service_dir.to_path_buf(),
        }
    }

    pub async fn ensure(
        &self,
        user_key: &Path,
        service_dir: &Path,
    ) -> Result<SshKeyOutcome, ProvisionError> {
        let span = info_span!("usecase.ssh.ensure", key = %user_key.display());
        async {
            let mut outcome = SshKeyOutcome {
                generated: false,
                mirrored: false,
            };

            if let Some(user_dir) = user_key.parent() {
                self.fs
                    .create_dir_all(user_dir, SSH_DIR_MODE)
                    .await
                    .map_err(|e| ProvisionError::io(format!("creating {}", user_dir.display()), e))?;
            }

            if !self.fs.exists(user_key).await {
                let spec = CommandSpec::new("ssh-keygen")
                    .arg("-f")
                    .path_arg(user_key)
                    .args(["-t", "rsa", "-b", "2048", "-N", "", "-q"]);
                self.runner.run(&spec).await?;
                outcome.generated = true;
                info!("Generated SSH key pair");
            }

            let mirror = Self::mirror_path(user_key, service_dir);
            if !self.fs.exists(&mirror).await {
                self.fs
                    .create_dir_all(service_dir, SSH_DIR_MODE)
                    .await
                    .map_err(|e| {
                        ProvisionError::io(format!("creating {}", service_dir.display()), e)
                    })?;
                self.copy(user_key, &mirror).await?;
                self.fs
                    .set_mode(&mirror, PRIVATE_KEY_MODE)
                    .await
                    .map_err(|e| ProvisionError::Permission {
                        path: mirror.clone(),
                        reason: e.to_string(),
                    })?;

                let user_pub = public_key_path(user_key);
                if self.fs.exists(&user_pub).await {
                    self.copy(&user_pub, &public_key_path(&mirror)).await?;
                }

                self.ownership
                    .assign(service_dir, true)
                    .await
                    .map_err(|e| ProvisionError::Permission {
                        path: service_dir.to_path_buf(),
                        reason: e.to_string(),
                    })?;
                outcome.mirrored = true;
                info!(mirror = %mirror.display(), owner = %self.ownership.owner(), "Mirrored SSH key for the service account");
            }

            Ok(outcome)
        }
        .instrument(span)
        .await
    }

    async fn copy(&self, from: &Path, to: &Path) -> Result<(), ProvisionError> {
        self.fs.copy_file(from, to).await.map(|_| ()).map_err(|e| {
            ProvisionError::io(
                format!("copying {} to {}", from.display(), to.display()),
                e,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_infra::LocalFileSystem;
    use cc_platform::{RecordingCommandRunner, ServiceOwnership};

    struct Fixture {
        _dir: tempfile::TempDir,
        user_key: PathBuf,
        service_dir: PathBuf,
        runner: Arc<RecordingCommandRunner>,
        provisioner: SshKeyProvisioner,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let user_key = dir.path().join("home").join(".ssh").join("cyclecloud.pem");
        let service_dir = dir.path().join("opt").join(".ssh");
        let runner = Arc::new(RecordingCommandRunner::new());
        runner.on_run("ssh-keygen", |spec| {
            let key = PathBuf::from(spec.arg_list()[1].value());
            std::fs::write(&key, b"private").unwrap();
            std::fs::write(public_key_path(&key), b"public").unwrap();
        });
        let provisioner = SshKeyProvisioner::new(
            runner.clone(),
            Arc::new(LocalFileSystem::new()),
            Arc::new(ServiceOwnership::new(runner.clone(), "cycle_server:")),
        );
        Fixture {
            _dir: dir,
            user_key,
            service_dir,
            runner,
            provisioner,
        }
    }

    #[tokio::test]
    async fn first_run_generates_and_mirrors() {
        let f = fixture();

        let outcome = f.provisioner.ensure(&f.user_key, &f.service_dir).await.unwrap();

        assert_eq!(
            outcome,
            SshKeyOutcome {
                generated: true,
                mirrored: true
            }
        );
        let keygen = &f.runner.commands()[0];
        assert!(keygen.starts_with("ssh-keygen -f "));
        assert!(keygen.ends_with("-t rsa -b 2048 -N  -q"));
        assert_eq!(f.runner.calls()[0].arg_list()[7].value(), "");
        assert_eq!(
            std::fs::read(f.service_dir.join("cyclecloud.pem")).unwrap(),
            b"private"
        );
        assert_eq!(
            std::fs::read(f.service_dir.join("cyclecloud.pem.pub")).unwrap(),
            b"public"
        );
        assert!(f.runner.invoked("chown -R cycle_server: "));
        assert!(f.provisioner.is_provisioned(&f.user_key, &f.service_dir).await);
    }

    #[tokio::test]
    async fn second_run_changes_nothing() {
        let f = fixture();
        f.provisioner.ensure(&f.user_key, &f.service_dir).await.unwrap();
        let before = f.runner.commands().len();

        let outcome = f.provisioner.ensure(&f.user_key, &f.service_dir).await.unwrap();

        assert_eq!(
            outcome,
            SshKeyOutcome {
                generated: false,
                mirrored: false
            }
        );
        assert_eq!(f.runner.commands().len(), before);
    }

    #[tokio::test]
    async fn existing_user_key_is_mirrored_not_regenerated() {
        let f = fixture();
        std::fs::create_dir_all(f.user_key.parent().unwrap()).unwrap();
        std::fs::write(&f.user_key, b"existing").unwrap();

        let outcome = f.provisioner.ensure(&f.user_key, &f.service_dir).await.unwrap();

        assert!(!outcome.generated);
        assert!(outcome.mirrored);
        assert!(!f.runner.invoked("ssh-keygen"));
        assert_eq!(
            std::fs::read(f.service_dir.join("cyclecloud.pem")).unwrap(),
            b"existing"
        );
    }

    #[tokio::test]
    async fn existing_mirror_is_never_overwritten() {
        let f = fixture();
        std::fs::create_dir_all(&f.service_dir).unwrap();
        std::fs::write(f.service_dir.join("cyclecloud.pem"), b"service-copy").unwrap();

        let outcome = f.provisioner.ensure(&f.user_key, &f.service_dir).await.unwrap();

        assert!(outcome.generated);
        assert!(!outcome.mirrored);
        assert_eq!(
            std::fs::read(f.service_dir.join("cyclecloud.pem")).unwrap(),
            b"service-copy"
        );
        assert!(!f.runner.invoked("chown"));
    }
}
