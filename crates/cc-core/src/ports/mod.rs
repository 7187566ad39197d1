//! Port interfaces for the provisioning use cases
//!
//! Ports define the contract between the orchestration logic in `cc-app`
//! and the infrastructure/platform implementations. Every external effect
//! (processes, HTTP, the filesystem, ownership changes) goes through one of
//! these traits so the step sequence can be exercised with fakes.

pub mod artifact;
pub mod command;
pub mod filesystem;
pub mod metadata;
pub mod ownership;
pub mod properties;

pub use artifact::{ArtifactFetcherPort, FetchError};
pub use command::{CommandArg, CommandError, CommandOutput, CommandRunnerPort, CommandSpec};
pub use filesystem::FileSystemPort;
pub use metadata::{MetadataError, MetadataPort};
pub use ownership::OwnershipPort;
pub use properties::{ConfigWriteError, PatchOutcome, PropertiesPatchPort};
