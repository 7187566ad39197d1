//! Registers the cloud provider account with the freshly installed server.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use cc_core::account::{
    build_settings, derive_storage_account_name, ProviderAccount, StorageBackendSection,
    STORAGE_CONTAINER,
};
use cc_core::ports::{CommandRunnerPort, CommandSpec, FileSystemPort, MetadataPort, OwnershipPort};
use cc_core::{ProvisionError, ProvisioningContext, RegistrationStage};
use tracing::{info, info_span, Instrument};

use crate::server::ServerControl;

pub const SETTINGS_DOCUMENT: &str = "cyclecloud_settings.json";
pub const ACCOUNT_DOCUMENT: &str = "azure_account.json";

/// Documents carry credentials.
const DOCUMENT_MODE: u32 = 0o600;
const DATA_DIR_MODE: u32 = 0o755;

fn at<E: fmt::Display>(stage: RegistrationStage) -> impl Fn(E) -> ProvisionError {
    move |e| ProvisionError::registration(stage, e)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationSummary {
    pub storage_account: String,
    pub settings_document: PathBuf,
    pub account_document: PathBuf,
    /// `false` when the storage tool already had a backend section.
    pub tool_config_updated: bool,
}

pub struct CloudAccountRegistrarDeps {
    pub metadata: Arc<dyn MetadataPort>,
    pub fs: Arc<dyn FileSystemPort>,
    pub runner: Arc<dyn CommandRunnerPort>,
    pub ownership: Arc<dyn OwnershipPort>,
    pub server: ServerControl,
}

pub struct CloudAccountRegistrar {
    metadata: Arc<dyn MetadataPort>,
    fs: Arc<dyn FileSystemPort>,
    runner: Arc<dyn CommandRunnerPort>,
    ownership: Arc<dyn OwnershipPort>,
    server: ServerControl,
    cli: String,
    server_url: String,
}

impl CloudAccountRegistrar {
    pub fn from_deps(
        deps: CloudAccountRegistrarDeps,
        cli: impl Into<String>,
        server_url: impl Into<String>,
    ) -> Self {
        let CloudAccountRegistrarDeps {
            metadata,
            fs,
            runner,
            ownership,
            server,
        } = deps;

        Self {
            metadata,
            fs,
            runner,
            ownership,
            server,
            cli: cli.into(),
            server_url: server_url.into(),
        }
    }

    pub async fn register(
        &self,
        ctx: &ProvisioningContext,
    ) -> Result<RegistrationSummary, ProvisionError> {
        let span = info_span!("usecase.registrar.register");
        async {
            let principal = ctx.service_principal().ok_or_else(|| {
                ProvisionError::registration(
                    RegistrationStage::Documents,
                    "service principal credentials were not supplied",
                )
            })?;

            let metadata = self.metadata.fetch().await?;
            let storage_account = derive_storage_account_name(metadata.resource_group())?;
            info!(storage_account = %storage_account, "Derived storage account name");

            // Documents
            let account = ProviderAccount::new(&metadata, principal, storage_account.clone());
            let settings = build_settings(ctx);
            let account_json =
                serde_json::to_vec_pretty(&account).map_err(at(RegistrationStage::Documents))?;
            let settings_json =
                serde_json::to_vec_pretty(&settings).map_err(at(RegistrationStage::Documents))?;

            let account_document = ctx.working_dir().join(ACCOUNT_DOCUMENT);
            let settings_document = ctx.working_dir().join(SETTINGS_DOCUMENT);
            self.fs
                .write_file(&account_document, &account_json, DOCUMENT_MODE)
                .await
                .map_err(at(RegistrationStage::Documents))?;
            self.fs
                .write_file(&settings_document, &settings_json, DOCUMENT_MODE)
                .await
                .map_err(at(RegistrationStage::Documents))?;

            // Ingest
            let data_dir = ctx.layout().data_dir();
            let ingested = data_dir.join(SETTINGS_DOCUMENT);
            self.fs
                .create_dir_all(&data_dir, DATA_DIR_MODE)
                .await
                .map_err(at(RegistrationStage::Ingest))?;
            self.fs
                .copy_file(&settings_document, &ingested)
                .await
                .map_err(at(RegistrationStage::Ingest))?;
            self.fs
                .set_mode(&ingested, DOCUMENT_MODE)
                .await
                .map_err(at(RegistrationStage::Ingest))?;
            self.ownership
                .assign(&ingested, false)
                .await
                .map_err(|e| ProvisionError::registration_command(RegistrationStage::Ingest, &e))?;
            info!(path = %ingested.display(), "Queued settings for import");

            // Server and CLI
            self.server.ensure_running().await.map_err(|e| {
                ProvisionError::registration_command(RegistrationStage::ServerStartup, &e)
            })?;

            let initialize = CommandSpec::new(self.cli.clone())
                .args(["initialize", "--batch"])
                .arg(format!("--url={}", self.server_url))
                .arg("--verify-ssl=false")
                .arg(format!("--username={}", ctx.admin_username()))
                .secret_arg(format!("--password={}", ctx.admin_password().expose()));
            self.runner.run(&initialize).await.map_err(|e| {
                ProvisionError::registration_command(RegistrationStage::Initialize, &e)
            })?;

            let create = CommandSpec::new(self.cli.clone())
                .args(["account", "create", "-f"])
                .path_arg(&account_document);
            self.runner.run(&create).await.map_err(|e| {
                ProvisionError::registration_command(RegistrationStage::AccountCreate, &e)
            })?;
            info!(storage_account = %storage_account, "Registered provider account");

            // Storage tool
            let tool_config_updated = self.configure_storage_tool(
                ctx,
                StorageBackendSection {
                    subscription_id: metadata.subscription_id(),
                    principal,
                    storage_account: &storage_account,
                    container: STORAGE_CONTAINER,
                },
            )
            .await?;

            Ok(RegistrationSummary {
                storage_account,
                settings_document,
                account_document,
                tool_config_updated,
            })
        }
        .instrument(span)
        .await
    }

    async fn configure_storage_tool(
        &self,
        ctx: &ProvisioningContext,
        section: StorageBackendSection<'_>,
    ) -> Result<bool, ProvisionError> {
        let path = ctx.layout().storage_tool_config();
        let existing = self
            .fs
            .read_to_string(path)
            .await
            .map_err(at(RegistrationStage::ToolConfig))?
            .unwrap_or_default();
        if StorageBackendSection::present_in(&existing) {
            info!(path = %path.display(), "Storage tool already configured");
            return Ok(false);
        }

        let mut block = String::new();
        if !existing.is_empty() && !existing.ends_with('\n') {
            block.push('\n');
        }
        block.push_str(section.render().expose());
        self.fs
            .append(path, &block)
            .await
            .map_err(at(RegistrationStage::ToolConfig))?;
        info!(path = %path.display(), "Added storage backend to storage tool config");
        Ok(true)
    }
}
