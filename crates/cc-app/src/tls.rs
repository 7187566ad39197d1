//! Self-signed keystore issuance for the server's HTTPS listener.

use std::path::Path;
use std::sync::Arc;

use cc_core::error::CertGenerationError;
use cc_core::ports::{CommandRunnerPort, CommandSpec, FileSystemPort, OwnershipPort};
use cc_core::SecretString;
use tracing::{info, info_span, Instrument};

pub const KEY_ALIAS: &str = "CycleServer";
pub const DEFAULT_DNAME: &str =
    "CN=cycleserver.azure.com,OU=Unknown,O=Unknown,L=Unknown,ST=Unknown,C=Unknown";
const KEY_SIZE: &str = "2048";
const VALIDITY_DAYS: &str = "3650";

pub struct TlsCertProvisioner {
    runner: Arc<dyn CommandRunnerPort>,
    fs: Arc<dyn FileSystemPort>,
    ownership: Arc<dyn OwnershipPort>,
    keytool: String,
}

impl TlsCertProvisioner {
    pub fn new(
        runner: Arc<dyn CommandRunnerPort>,
        fs: Arc<dyn FileSystemPort>,
        ownership: Arc<dyn OwnershipPort>,
    ) -> Self {
        Self {
            runner,
            fs,
            ownership,
            keytool: "keytool".to_string(),
        }
    }

    /// Always regenerates: any existing keystore at `keystore` is replaced.
    pub async fn issue_self_signed(
        &self,
        keystore: &Path,
        password: &SecretString,
        dname: &str,
    ) -> Result<(), CertGenerationError> {
        let span = info_span!("usecase.tls.issue_self_signed", keystore = %keystore.display());
        async {
            // keytool refuses to add an alias that already exists.
            let removed = self.fs.remove_file(keystore).await.map_err(|source| {
                CertGenerationError::StaleKeystore {
                    path: keystore.to_path_buf(),
                    source,
                }
            })?;
            if removed {
                info!("Removed previous keystore");
            }

            let spec = CommandSpec::new(self.keytool.clone())
                .args(["-genkeypair", "-alias", KEY_ALIAS, "-keyalg", "RSA"])
                .args(["-keysize", KEY_SIZE, "-validity", VALIDITY_DAYS])
                .arg("-keystore")
                .path_arg(keystore)
                .arg("-storepass")
                .secret_arg(password.expose())
                .arg("-keypass")
                .secret_arg(password.expose())
                .args(["-noprompt", "-dname", dname]);
            self.runner
                .run(&spec)
                .await
                .map_err(CertGenerationError::Keytool)?;

            let protect_err = |reason: String| CertGenerationError::Protect {
                path: keystore.to_path_buf(),
                reason,
            };
            self.fs
                .set_mode(keystore, 0o600)
                .await
                .map_err(|e| protect_err(e.to_string()))?;
            self.ownership
                .assign(keystore, false)
                .await
                .map_err(|e| protect_err(e.to_string()))?;

            info!(owner = %self.ownership.owner(), "Issued self-signed keystore");
            Ok(())
        }
        .instrument(span)
        .await
    }
}
