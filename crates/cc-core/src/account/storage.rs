//! Storage account naming and the storage tool's backend section.

use std::fmt::Write as _;

use crate::context::ServicePrincipal;
use crate::security::{random_suffix, SecretAlphabet, SecretError, SecretString};

/// Azure storage account names are 3-24 lowercase alphanumerics.
pub const STORAGE_NAME_MAX_LEN: usize = 24;
pub const STORAGE_SUFFIX_LEN: usize = 8;
pub const STORAGE_PREFIX_MAX_LEN: usize = STORAGE_NAME_MAX_LEN - STORAGE_SUFFIX_LEN;

/// Deterministic part of the storage name: ASCII alphanumerics of the
/// resource group, lowercased, truncated to [`STORAGE_PREFIX_MAX_LEN`].
pub fn sanitize_prefix(resource_group: &str) -> String {
    resource_group
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .take(STORAGE_PREFIX_MAX_LEN)
        .collect()
}

pub fn storage_account_name(resource_group: &str, suffix: &str) -> String {
    let mut name = sanitize_prefix(resource_group);
    name.push_str(suffix);
    name
}

/// `sanitize_prefix(resource_group)` plus a fresh random suffix.
pub fn derive_storage_account_name(resource_group: &str) -> Result<String, SecretError> {
    let suffix = random_suffix(STORAGE_SUFFIX_LEN, SecretAlphabet::LowercaseAlphanumeric)?;
    Ok(storage_account_name(resource_group, &suffix))
}

/// Backend section appended to the storage tool's `pogo.ini`.
#[derive(Debug)]
pub struct StorageBackendSection<'a> {
    pub subscription_id: &'a str,
    pub principal: &'a ServicePrincipal,
    pub storage_account: &'a str,
    pub container: &'a str,
}

impl StorageBackendSection<'_> {
    pub const HEADER: &'static str = "[pogo azure-storage]";

    /// Whether `existing` already carries the section header.
    pub fn present_in(existing: &str) -> bool {
        existing.lines().any(|line| line.trim() == Self::HEADER)
    }

    /// Section text including the application secret.
    pub fn render(&self) -> SecretString {
        let mut out = String::new();
        let _ = writeln!(out, "{}", Self::HEADER);
        let _ = writeln!(out, "type = az");
        let _ = writeln!(out, "subscription_id = {}", self.subscription_id);
        let _ = writeln!(out, "tenant_id = {}", self.principal.tenant_id);
        let _ = writeln!(out, "application_id = {}", self.principal.application_id);
        let _ = writeln!(
            out,
            "application_secret = {}",
            self.principal.application_secret.expose()
        );
        let _ = writeln!(out, "matches = az://{}/{}", self.storage_account, self.container);
        SecretString::new(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_group_is_lowercased_and_stripped() {
        assert_eq!(sanitize_prefix("My-RG_01"), "myrg01");
        assert_eq!(storage_account_name("My-RG_01", "abcd1234"), "myrg01abcd1234");
    }

    #[test]
    fn long_resource_group_keeps_name_within_limit() {
        let name = storage_account_name("a-very-long-resource-group-name-for-tests", "zz99zz99");
        assert_eq!(name.len(), STORAGE_NAME_MAX_LEN);
        assert!(name.starts_with("averylongresourc"));
    }

    #[test]
    fn derived_names_share_prefix_and_differ_in_suffix() {
        let a = derive_storage_account_name("My-RG_01").unwrap();
        let b = derive_storage_account_name("My-RG_01").unwrap();
        for name in [&a, &b] {
            assert!(name.starts_with("myrg01"));
            assert_eq!(name.len(), "myrg01".len() + STORAGE_SUFFIX_LEN);
            assert!(name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
        assert_ne!(a, b);
    }

    #[test]
    fn non_ascii_characters_are_dropped() {
        assert_eq!(sanitize_prefix("rg-ümlaut-Ωmega"), "rgmlautmega");
    }

    #[test]
    fn section_renders_key_value_block() {
        let principal = ServicePrincipal {
            tenant_id: "tenant-1".to_string(),
            application_id: "app-1".to_string(),
            application_secret: SecretString::new("s3cret".to_string()),
        };
        let section = StorageBackendSection {
            subscription_id: "sub-1",
            principal: &principal,
            storage_account: "myrg01abcd1234",
            container: "cyclecloud",
        };
        let rendered = section.render();
        assert_eq!(
            rendered.expose(),
            "[pogo azure-storage]\n\
             type = az\n\
             subscription_id = sub-1\n\
             tenant_id = tenant-1\n\
             application_id = app-1\n\
             application_secret = s3cret\n\
             matches = az://myrg01abcd1234/cyclecloud\n"
        );
        assert!(StorageBackendSection::present_in(rendered.expose()));
        assert!(!StorageBackendSection::present_in("[pogo other]\n"));
    }
}
