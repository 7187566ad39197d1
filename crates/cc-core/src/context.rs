//! Run context shared by every provisioning step.
//!
//! The context is built once, before the first step runs, and is only ever
//! handed out by shared reference. There are no setters.

use std::path::{Path, PathBuf};

use crate::config::BootstrapConfig;
use crate::security::SecretString;

/// Azure service principal used to register the provider account.
#[derive(Debug)]
pub struct ServicePrincipal {
    pub tenant_id: String,
    pub application_id: String,
    pub application_secret: SecretString,
}

/// CycleCloud portal account recorded as the support contact.
#[derive(Debug)]
pub struct PortalAccount {
    pub account: String,
    pub password: Option<SecretString>,
}

/// Filesystem layout of the target installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    pub install_root: PathBuf,
    pub service_account: String,
    pub user_home: PathBuf,
    storage_tool_config: PathBuf,
}

impl InstallLayout {
    pub fn new(config: &BootstrapConfig, user_home: impl Into<PathBuf>) -> Self {
        let user_home = user_home.into();
        let storage_tool_config = config
            .storage_tool_config
            .clone()
            .unwrap_or_else(|| user_home.join(".cycle").join("pogo.ini"));
        Self {
            install_root: config.install_root.clone(),
            service_account: config.service_account.clone(),
            user_home,
            storage_tool_config,
        }
    }

    /// `cycle_server` control script.
    pub fn server_binary(&self) -> PathBuf {
        self.install_root.join("cycle_server")
    }

    pub fn properties_file(&self) -> PathBuf {
        self.install_root.join("config").join("cycle_server.properties")
    }

    pub fn keystore(&self) -> PathBuf {
        self.install_root.join(".keystore")
    }

    pub fn license_file(&self) -> PathBuf {
        self.install_root.join("license.dat")
    }

    /// Directory the server imports `*.json` record files from.
    pub fn data_dir(&self) -> PathBuf {
        self.install_root.join("config").join("data")
    }

    pub fn service_ssh_dir(&self) -> PathBuf {
        self.install_root.join(".ssh")
    }

    pub fn service_ssh_key(&self) -> PathBuf {
        self.service_ssh_dir().join(SSH_KEY_NAME)
    }

    pub fn user_ssh_dir(&self) -> PathBuf {
        self.user_home.join(".ssh")
    }

    pub fn user_ssh_key(&self) -> PathBuf {
        self.user_ssh_dir().join(SSH_KEY_NAME)
    }

    pub fn storage_tool_config(&self) -> &Path {
        &self.storage_tool_config
    }

    /// `user:` form accepted by `chown` (user plus login group).
    pub fn service_owner(&self) -> String {
        format!("{}:", self.service_account)
    }
}

/// Private key name shared by the user and service-side copies.
pub const SSH_KEY_NAME: &str = "cyclecloud.pem";

/// Everything the caller supplies for one run.
pub struct ProvisioningInputs {
    pub download_url: String,
    pub license_url: Option<String>,
    pub service_principal: Option<ServicePrincipal>,
    pub portal: Option<PortalAccount>,
    pub admin_username: String,
    pub admin_password: SecretString,
    pub keystore_password: SecretString,
}

/// Immutable bag of run parameters.
#[derive(Debug)]
pub struct ProvisioningContext {
    download_url: String,
    license_url: Option<String>,
    service_principal: Option<ServicePrincipal>,
    portal: Option<PortalAccount>,
    admin_username: String,
    admin_password: SecretString,
    keystore_password: SecretString,
    working_dir: PathBuf,
    layout: InstallLayout,
}

impl ProvisioningContext {
    pub fn new(inputs: ProvisioningInputs, layout: InstallLayout, working_dir: PathBuf) -> Self {
        let ProvisioningInputs {
            download_url,
            license_url,
            service_principal,
            portal,
            admin_username,
            admin_password,
            keystore_password,
        } = inputs;

        Self {
            download_url: download_url.trim_end_matches('/').to_string(),
            license_url,
            service_principal,
            portal,
            admin_username,
            admin_password,
            keystore_password,
            working_dir,
            layout,
        }
    }

    /// Base URL the release artifacts are downloaded from, without trailing slash.
    pub fn download_url(&self) -> &str {
        &self.download_url
    }

    pub fn license_url(&self) -> Option<&str> {
        self.license_url.as_deref()
    }

    pub fn service_principal(&self) -> Option<&ServicePrincipal> {
        self.service_principal.as_ref()
    }

    pub fn portal(&self) -> Option<&PortalAccount> {
        self.portal.as_ref()
    }

    pub fn admin_username(&self) -> &str {
        &self.admin_username
    }

    pub fn admin_password(&self) -> &SecretString {
        &self.admin_password
    }

    pub fn keystore_password(&self) -> &SecretString {
        &self.keystore_password
    }

    /// Scratch directory for downloads and extracted archives.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }
}
