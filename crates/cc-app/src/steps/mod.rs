//! The concrete provisioning steps, in the order the orchestrator plans them.

pub mod artifacts;
pub mod configure;
pub mod install;
pub mod license;
pub mod prerequisites;
pub mod register;
pub mod ssh_key;
pub mod start;

#[cfg(test)]
pub(crate) mod testing;

pub use artifacts::{DownloadArtifacts, UnpackArtifacts, ARCHIVES};
pub use configure::ConfigureServer;
pub use install::{InstallCliTools, InstallServer, CLI_INSTALLERS};
pub use license::FetchLicense;
pub use prerequisites::InstallPrerequisites;
pub use register::RegisterAccount;
pub use ssh_key::EnsureSshKey;
pub use start::StartServer;
