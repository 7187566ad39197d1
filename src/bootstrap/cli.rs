//! Command line surface.
//!
//! Flag spellings are the ones VM extension templates already pass, so they
//! stay camelCase.

use std::path::PathBuf;

use cc_core::context::{PortalAccount, ProvisioningInputs, ServicePrincipal};
use cc_core::security::{generate_secret, SecretAlphabet, SecretError, DEFAULT_PASSWORD_LEN};
use cc_core::SecretString;
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "cyclecloud-bootstrap",
    version,
    about = "Install and configure a CycleCloud server on this VM"
)]
pub struct Cli {
    /// Base URL the release archives are downloaded from.
    #[arg(long = "downloadURL", value_name = "URL")]
    pub download_url: String,

    /// Trial license to install next to the server.
    #[arg(long = "licenseURL", value_name = "URL")]
    pub license_url: Option<String>,

    /// Admin password (older spelling; `--cyclecloudAdminPW` wins).
    #[arg(long = "cycleserverPW", value_name = "PASSWORD")]
    pub cycleserver_pw: Option<String>,

    #[arg(long = "tenantId")]
    pub tenant_id: Option<String>,

    #[arg(long = "applicationId", alias = "applicationID")]
    pub application_id: Option<String>,

    #[arg(long = "applicationSecret")]
    pub application_secret: Option<String>,

    /// Portal account recorded as the support contact.
    #[arg(long = "cyclePortalAccount", value_name = "EMAIL")]
    pub portal_account: Option<String>,

    #[arg(long = "cyclePortalPW", value_name = "PASSWORD")]
    pub portal_pw: Option<String>,

    #[arg(long = "cyclecloudAdminPW", value_name = "PASSWORD")]
    pub admin_pw: Option<String>,

    /// TOML file with host settings.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the step plan and exit without changing anything.
    #[arg(long = "dry-plan")]
    pub dry_plan: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Secret(#[from] SecretError),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(_) => 2,
            CliError::Secret(_) => 1,
        }
    }
}

impl Cli {
    /// All three principal flags, or none of them.
    fn service_principal(&mut self) -> Result<Option<ServicePrincipal>, CliError> {
        match (
            self.tenant_id.take(),
            self.application_id.take(),
            self.application_secret.take(),
        ) {
            (Some(tenant_id), Some(application_id), Some(secret)) => Ok(Some(ServicePrincipal {
                tenant_id,
                application_id,
                application_secret: SecretString::new(secret),
            })),
            (None, None, None) => Ok(None),
            (tenant, app, _) => {
                let missing = match (tenant, app) {
                    (None, _) => "--tenantId",
                    (_, None) => "--applicationId",
                    _ => "--applicationSecret",
                };
                Err(CliError::Usage(format!(
                    "--tenantId, --applicationId and --applicationSecret must be given together \
                     (missing {missing})"
                )))
            }
        }
    }

    fn portal(&mut self) -> Result<Option<PortalAccount>, CliError> {
        match (self.portal_account.take(), self.portal_pw.take()) {
            (Some(account), password) => Ok(Some(PortalAccount {
                account,
                password: password.map(SecretString::new),
            })),
            (None, Some(_)) => Err(CliError::Usage(
                "--cyclePortalPW requires --cyclePortalAccount".to_string(),
            )),
            (None, None) => Ok(None),
        }
    }

    /// Run inputs. The admin password falls back from `--cyclecloudAdminPW`
    /// to `--cycleserverPW` to a generated one; the keystore password is
    /// always generated.
    pub fn into_inputs(mut self, admin_username: &str) -> Result<ProvisioningInputs, CliError> {
        let service_principal = self.service_principal()?;
        let portal = self.portal()?;

        let admin_password = match self.admin_pw.take().or_else(|| self.cycleserver_pw.take()) {
            Some(password) => SecretString::new(password),
            None => {
                info!("No admin password supplied, generating one");
                generate_secret(DEFAULT_PASSWORD_LEN, SecretAlphabet::Alphanumeric)?
            }
        };
        let keystore_password = generate_secret(DEFAULT_PASSWORD_LEN, SecretAlphabet::Alphanumeric)?;

        Ok(ProvisioningInputs {
            download_url: self.download_url,
            license_url: self.license_url,
            service_principal,
            portal,
            admin_username: admin_username.to_string(),
            admin_password,
            keystore_password,
        })
    }
}
