//! JSON records handed to the server: the settings/user list imported from the
//! data directory and the provider account descriptor submitted via the CLI.
//!
//! Records borrow their secrets from the [`ProvisioningContext`] so no copy of
//! a password outlives the run context.

use serde::{Serialize, Serializer};

use super::InstanceMetadata;
use crate::context::{ProvisioningContext, ServicePrincipal};
use crate::security::SecretString;

/// Blob container created in the derived storage account.
pub const STORAGE_CONTAINER: &str = "cyclecloud";

/// Name of the registered provider account.
pub const DEFAULT_ACCOUNT_NAME: &str = "azure";

const PROVIDER: &str = "azure";
const ENVIRONMENT: &str = "public";

fn expose_secret<S: Serializer>(secret: &&SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose())
}

/// Value of an `Application.Setting` record.
#[derive(Debug)]
pub enum SettingValue<'a> {
    Flag(bool),
    Text(String),
    Secret(&'a SecretString),
}

impl Serialize for SettingValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SettingValue::Flag(flag) => serializer.serialize_bool(*flag),
            SettingValue::Text(text) => serializer.serialize_str(text),
            SettingValue::Secret(secret) => serializer.serialize_str(secret.expose()),
        }
    }
}

/// One entry of the settings document, discriminated by `AdType`.
#[derive(Debug, Serialize)]
#[serde(tag = "AdType")]
pub enum AccountRecord<'a> {
    #[serde(rename = "Application.Setting", rename_all = "PascalCase")]
    ApplicationSetting {
        name: String,
        value: SettingValue<'a>,
        #[serde(skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },
    #[serde(rename = "AuthenticatedUser", rename_all = "PascalCase")]
    AuthenticatedUser {
        name: String,
        #[serde(serialize_with = "expose_secret")]
        raw_password: &'a SecretString,
        superuser: bool,
    },
}

impl<'a> AccountRecord<'a> {
    pub fn setting(name: impl Into<String>, value: SettingValue<'a>) -> Self {
        AccountRecord::ApplicationSetting {
            name: name.into(),
            value,
            category: None,
        }
    }

    pub fn system_setting(name: impl Into<String>, value: SettingValue<'a>) -> Self {
        AccountRecord::ApplicationSetting {
            name: name.into(),
            value,
            category: Some("system".to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AccountRecord::ApplicationSetting { name, .. }
            | AccountRecord::AuthenticatedUser { name, .. } => name,
        }
    }
}

/// Settings and users imported on first start.
pub fn build_settings(ctx: &ProvisioningContext) -> Vec<AccountRecord<'_>> {
    let mut records = vec![
        AccountRecord::system_setting(
            "distribution_method",
            SettingValue::Text("manual".to_string()),
        ),
        AccountRecord::setting(
            "cycleserver.send_anonymous_usage_data",
            SettingValue::Flag(true),
        ),
        AccountRecord::setting(
            "cycleserver.installation.initial_user",
            SettingValue::Text(ctx.admin_username().to_string()),
        ),
        AccountRecord::setting("cycleserver.installation.complete", SettingValue::Flag(true)),
        AccountRecord::AuthenticatedUser {
            name: ctx.admin_username().to_string(),
            raw_password: ctx.admin_password(),
            superuser: true,
        },
    ];

    if let Some(portal) = ctx.portal() {
        records.push(AccountRecord::setting(
            "cycleserver.support.account",
            SettingValue::Text(portal.account.clone()),
        ));
        if let Some(password) = &portal.password {
            records.push(AccountRecord::setting(
                "cycleserver.support.password",
                SettingValue::Secret(password),
            ));
        }
    }

    records
}

/// Cloud provider account descriptor accepted by `cyclecloud account create -f`.
#[derive(Debug, Serialize)]
pub struct ProviderAccount<'a> {
    #[serde(rename = "Environment")]
    pub environment: &'static str,
    #[serde(rename = "AzureRMSubscriptionId")]
    pub subscription_id: String,
    #[serde(rename = "AzureRMTenantId")]
    pub tenant_id: String,
    #[serde(rename = "AzureRMApplicationId")]
    pub application_id: String,
    #[serde(rename = "AzureRMApplicationSecret", serialize_with = "expose_secret")]
    pub application_secret: &'a SecretString,
    #[serde(rename = "AzureResourceGroup")]
    pub resource_group: String,
    #[serde(rename = "RMStorageAccount")]
    pub storage_account: String,
    #[serde(rename = "RMStorageContainer")]
    pub storage_container: String,
    #[serde(rename = "DefaultAccount")]
    pub default_account: bool,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Provider")]
    pub provider: &'static str,
    #[serde(rename = "ProviderId")]
    pub provider_id: String,
}

impl<'a> ProviderAccount<'a> {
    pub fn new(
        metadata: &InstanceMetadata,
        principal: &'a ServicePrincipal,
        storage_account: impl Into<String>,
    ) -> Self {
        Self {
            environment: ENVIRONMENT,
            subscription_id: metadata.subscription_id().to_string(),
            tenant_id: principal.tenant_id.clone(),
            application_id: principal.application_id.clone(),
            application_secret: &principal.application_secret,
            resource_group: metadata.resource_group().to_string(),
            storage_account: storage_account.into(),
            storage_container: STORAGE_CONTAINER.to_string(),
            default_account: true,
            location: metadata.location().to_string(),
            name: DEFAULT_ACCOUNT_NAME.to_string(),
            provider: PROVIDER,
            provider_id: metadata.subscription_id().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;
    use crate::account::metadata::ComputeMetadata;
    use crate::config::BootstrapConfig;
    use crate::context::{InstallLayout, PortalAccount, ProvisioningInputs};

    fn metadata() -> InstanceMetadata {
        InstanceMetadata {
            compute: ComputeMetadata {
                subscription_id: "sub-1".to_string(),
                location: "eastus".to_string(),
                resource_group_name: "My-RG_01".to_string(),
            },
        }
    }

    fn context(portal: Option<PortalAccount>) -> ProvisioningContext {
        let inputs = ProvisioningInputs {
            download_url: "https://example.test".to_string(),
            license_url: None,
            service_principal: Some(ServicePrincipal {
                tenant_id: "tenant-1".to_string(),
                application_id: "app-1".to_string(),
                application_secret: SecretString::new("app-secret".to_string()),
            }),
            portal,
            admin_username: "admin".to_string(),
            admin_password: SecretString::new("admin-pw".to_string()),
            keystore_password: SecretString::new("store-pw".to_string()),
        };
        let layout = InstallLayout::new(&BootstrapConfig::default(), "/root");
        ProvisioningContext::new(inputs, layout, PathBuf::from("/tmp/work"))
    }

    #[test]
    fn provider_account_uses_fixed_field_names() {
        let ctx = context(None);
        let principal = ctx.service_principal().unwrap();
        let account = ProviderAccount::new(&metadata(), principal, "myrg01abcdefgh");

        let value = serde_json::to_value(&account).unwrap();
        assert_eq!(
            value,
            json!({
                "Environment": "public",
                "AzureRMSubscriptionId": "sub-1",
                "AzureRMTenantId": "tenant-1",
                "AzureRMApplicationId": "app-1",
                "AzureRMApplicationSecret": "app-secret",
                "AzureResourceGroup": "My-RG_01",
                "RMStorageAccount": "myrg01abcdefgh",
                "RMStorageContainer": "cyclecloud",
                "DefaultAccount": true,
                "Location": "eastus",
                "Name": "azure",
                "Provider": "azure",
                "ProviderId": "sub-1"
            })
        );
        assert!(!format!("{:?}", account).contains("app-secret"));
    }

    #[test]
    fn settings_are_tagged_by_ad_type() {
        let ctx = context(None);
        let value = serde_json::to_value(build_settings(&ctx)).unwrap();
        let records = value.as_array().unwrap();

        assert_eq!(
            records[0],
            json!({
                "AdType": "Application.Setting",
                "Name": "distribution_method",
                "Value": "manual",
                "Category": "system"
            })
        );
        assert!(records.contains(&json!({
            "AdType": "Application.Setting",
            "Name": "cycleserver.installation.complete",
            "Value": true
        })));
        assert!(records.contains(&json!({
            "AdType": "AuthenticatedUser",
            "Name": "admin",
            "RawPassword": "admin-pw",
            "Superuser": true
        })));
        assert!(!records
            .iter()
            .any(|r| r["Name"] == "cycleserver.support.account"));
    }

    #[test]
    fn portal_account_adds_support_contact() {
        let ctx = context(Some(PortalAccount {
            account: "ops@example.test".to_string(),
            password: Some(SecretString::new("portal-pw".to_string())),
        }));
        let settings = build_settings(&ctx);
        let names: Vec<&str> = settings.iter().map(|r| r.name()).collect();
        assert!(names.contains(&"cycleserver.support.account"));
        assert!(names.contains(&"cycleserver.support.password"));
        assert!(!format!("{:?}", settings).contains("portal-pw"));

        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("portal-pw"));
    }
}
