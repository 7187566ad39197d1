//! # cc-core
//!
//! Core domain models and port contracts for CycleCloud bootstrap.
//!
//! This crate contains pure provisioning logic without any infrastructure dependencies:
//! the run context, properties rewriting, account records, the provisioning state
//! machine and the traits that adapters implement.

// Public module exports
pub mod account;
pub mod config;
pub mod context;
pub mod error;
pub mod ports;
pub mod provisioning;
pub mod security;

// Re-export commonly used types at the crate root
pub use account::{AccountRecord, InstanceMetadata, ProviderAccount};
pub use config::{BootstrapConfig, PatchRules};
pub use context::{InstallLayout, ProvisioningContext};
pub use error::{ProvisionError, RegistrationStage, StepFailure};
pub use provisioning::{Milestone, ProvisioningState};
pub use security::SecretString;
