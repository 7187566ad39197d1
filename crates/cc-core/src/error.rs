//! Error taxonomy for a provisioning run.
//!
//! Every variant is fatal to the run. The sequencer wraps the first one it
//! sees in a [`StepFailure`] together with the failing step's name.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::ports::{CommandError, ConfigWriteError, FetchError, MetadataError};
use crate::security::SecretError;

/// Stage of account registration that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStage {
    Metadata,
    Documents,
    Ingest,
    ServerStartup,
    Initialize,
    AccountCreate,
    ToolConfig,
}

impl fmt::Display for RegistrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegistrationStage::Metadata => "metadata",
            RegistrationStage::Documents => "documents",
            RegistrationStage::Ingest => "ingest",
            RegistrationStage::ServerStartup => "server-startup",
            RegistrationStage::Initialize => "initialize",
            RegistrationStage::AccountCreate => "account-create",
            RegistrationStage::ToolConfig => "tool-config",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum CertGenerationError {
    #[error("keytool failed: {0}")]
    Keytool(#[source] CommandError),
    #[error("could not clear stale keystore {path}: {source}")]
    StaleKeystore {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not restrict keystore {path}: {reason}")]
    Protect { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("download failed: {0}")]
    Download(#[from] FetchError),

    #[error("extracting {archive} failed: {source}")]
    Extraction {
        archive: PathBuf,
        #[source]
        source: CommandError,
    },

    #[error("changing ownership or mode of {path} failed: {reason}")]
    Permission { path: PathBuf, reason: String },

    #[error("rewriting configuration failed: {0}")]
    ConfigWrite(#[from] ConfigWriteError),

    #[error("certificate generation failed: {0}")]
    CertGeneration(#[from] CertGenerationError),

    #[error("instance metadata unavailable: {0}")]
    MetadataUnavailable(#[from] MetadataError),

    #[error("account registration failed at {stage}: {cause}")]
    Registration {
        stage: RegistrationStage,
        cause: String,
        exit_status: Option<i32>,
    },

    #[error("command failed: {0}")]
    Command(#[from] CommandError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("secret generation failed: {0}")]
    Secret(#[from] SecretError),

    #[error("step plan is invalid: {0}")]
    PlanInvalid(String),
}

impl ProvisionError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ProvisionError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn registration(stage: RegistrationStage, cause: impl fmt::Display) -> Self {
        ProvisionError::Registration {
            stage,
            cause: cause.to_string(),
            exit_status: None,
        }
    }

    /// Registration failure caused by an external command; keeps its exit status.
    pub fn registration_command(stage: RegistrationStage, err: &CommandError) -> Self {
        ProvisionError::Registration {
            stage,
            cause: err.to_string(),
            exit_status: err.exit_status(),
        }
    }

    /// Exit status of the sub-command that caused this error, if any.
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            ProvisionError::Extraction { source, .. } => source.exit_status(),
            ProvisionError::Command(err) => err.exit_status(),
            ProvisionError::CertGeneration(CertGenerationError::Keytool(err)) => err.exit_status(),
            ProvisionError::Registration { exit_status, .. } => *exit_status,
            _ => None,
        }
    }
}

/// The first failing step of a run.
#[derive(Debug, Error)]
#[error("step `{step}` failed: {cause}")]
pub struct StepFailure {
    pub step: String,
    #[source]
    pub cause: ProvisionError,
}

impl StepFailure {
    pub fn new(step: impl Into<String>, cause: ProvisionError) -> Self {
        Self {
            step: step.into(),
            cause,
        }
    }

    /// Process exit code: the failing sub-command's status when it has a
    /// usable one, otherwise 1.
    pub fn exit_code(&self) -> u8 {
        match self.cause.exit_status() {
            Some(status) if (1..=255).contains(&status) => status as u8,
            _ => 1,
        }
    }
}
