//! Shared fixtures for step unit tests.

use cc_core::context::ProvisioningInputs;
use cc_core::{BootstrapConfig, InstallLayout, ProvisioningContext, SecretString};
use tempfile::TempDir;

fn build(license_url: Option<&str>) -> (TempDir, ProvisioningContext) {
    let dir = tempfile::tempdir().unwrap();
    let work = dir.path().join("work");
    std::fs::create_dir_all(&work).unwrap();
    let config = BootstrapConfig {
        install_root: dir.path().join("opt").join("cycle_server"),
        ..BootstrapConfig::default()
    };
    let layout = InstallLayout::new(&config, dir.path().join("home"));
    let inputs = ProvisioningInputs {
        download_url: "https://example.test/releases/".to_string(),
        license_url: license_url.map(str::to_string),
        service_principal: None,
        portal: None,
        admin_username: "admin".to_string(),
        admin_password: SecretString::new("admin-pw".to_string()),
        keystore_password: SecretString::new("store-pw".to_string()),
    };
    let ctx = ProvisioningContext::new(inputs, layout, work);
    (dir, ctx)
}

/// Context rooted in a fresh temp dir: install root under `opt/`, home under
/// `home/`, working dir `work/`.
pub fn context() -> (TempDir, ProvisioningContext) {
    build(None)
}

pub fn context_with_license(url: &str) -> (TempDir, ProvisioningContext) {
    build(Some(url))
}
