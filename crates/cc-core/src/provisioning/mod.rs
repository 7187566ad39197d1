pub mod state;

pub use state::{Milestone, ProvisioningEvent, ProvisioningState, ProvisioningStateMachine};
