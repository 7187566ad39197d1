//! Bootstrap configuration domain model

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Host-level settings for a bootstrap run.
///
/// Everything here has a sensible default for the Azure marketplace image, so
/// the configuration file is optional. Run-specific inputs (URLs, credentials)
/// come from the command line instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Where the server installer puts `cycle_server`.
    pub install_root: PathBuf,
    /// Account the server runs as; owns keystore, license and SSH mirror.
    pub service_account: String,
    /// Runtime package installed before anything else.
    pub java_package: String,
    /// Package manager used for the runtime package (`yum`, `dnf`, ...).
    pub package_manager: String,
    pub metadata_url: String,
    /// Loopback URL the admin CLI talks to.
    pub server_url: String,
    pub admin_username: String,
    /// Admin CLI binary, resolved through `PATH` when relative.
    pub cyclecloud_cli: PathBuf,
    /// Storage tool config the backend section is appended to.
    /// Defaults to `~/.cycle/pogo.ini` when unset.
    pub storage_tool_config: Option<PathBuf>,
    pub lock_path: PathBuf,
    /// Also write logs here when set.
    pub log_dir: Option<PathBuf>,
    pub command_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub metadata_timeout_secs: u64,
    pub startup_poll_attempts: u32,
    pub startup_poll_interval_secs: u64,
}

impl BootstrapConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    pub fn startup_poll_interval(&self) -> Duration {
        Duration::from_secs(self.startup_poll_interval_secs)
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            install_root: PathBuf::from("/opt/cycle_server"),
            service_account: "cycle_server".to_string(),
            java_package: "java-1.8.0-openjdk".to_string(),
            package_manager: "yum".to_string(),
            metadata_url: "http://169.254.169.254/metadata/instance?api-version=2017-08-01"
                .to_string(),
            server_url: "https://localhost".to_string(),
            admin_username: "admin".to_string(),
            cyclecloud_cli: PathBuf::from("cyclecloud"),
            storage_tool_config: None,
            lock_path: PathBuf::from("/var/lock/cyclecloud-bootstrap.lock"),
            log_dir: None,
            command_timeout_secs: 600,
            download_timeout_secs: 1800,
            metadata_timeout_secs: 10,
            startup_poll_attempts: 30,
            startup_poll_interval_secs: 10,
        }
    }
}
