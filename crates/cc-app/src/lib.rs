//! CycleCloud bootstrap use cases
//!
//! The step implementations, the sequencer that runs them and the
//! orchestrator that plans a run. Everything here talks to the outside world
//! through the ports in `cc-core`.

pub mod deps;
pub mod orchestrator;
pub mod registrar;
pub mod sequencer;
pub mod server;
pub mod ssh;
pub mod step;
pub mod steps;
pub mod tls;

pub use deps::ProvisioningDeps;
pub use orchestrator::ProvisioningOrchestrator;
pub use registrar::{CloudAccountRegistrar, RegistrationSummary};
pub use sequencer::{PlannedStep, RunReport, StepOutcome, StepSequencer};
pub use server::{ServerControl, StartupPolicy};
pub use step::ProvisioningStep;
