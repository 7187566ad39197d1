//! Provisioning run state machine.
//!
//! Pure transition function; the orchestrator feeds it events reported by
//! the step sequencer.

use std::fmt;

use tracing::warn;

/// Progress points a step can complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Milestone {
    PrereqInstalled,
    Downloaded,
    Unpacked,
    Installed,
    Configured,
    AccountRegistered,
    Started,
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Milestone::PrereqInstalled => "prereq-installed",
            Milestone::Downloaded => "downloaded",
            Milestone::Unpacked => "unpacked",
            Milestone::Installed => "installed",
            Milestone::Configured => "configured",
            Milestone::AccountRegistered => "account-registered",
            Milestone::Started => "started",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningState {
    NotStarted,
    Reached(Milestone),
    Failed { step: String, cause: String },
}

impl ProvisioningState {
    /// `Started` and `Failed` accept no further events.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProvisioningState::Reached(Milestone::Started) | ProvisioningState::Failed { .. }
        )
    }

    pub fn milestone(&self) -> Option<Milestone> {
        match self {
            ProvisioningState::Reached(milestone) => Some(*milestone),
            _ => None,
        }
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisioningState::NotStarted => f.write_str("not-started"),
            ProvisioningState::Reached(milestone) => milestone.fmt(f),
            ProvisioningState::Failed { step, .. } => write!(f, "failed({})", step),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningEvent {
    MilestoneReached(Milestone),
    StepFailed { step: String, cause: String },
}

pub struct ProvisioningStateMachine;

impl ProvisioningStateMachine {
    /// Milestones only move forward. Reaching a milestone at or behind the
    /// current one (e.g. `Configured` from both TLS and SSH steps) leaves the
    /// state unchanged; skipping ahead is allowed because optional steps may
    /// be absent from the plan.
    pub fn transition(state: ProvisioningState, event: ProvisioningEvent) -> ProvisioningState {
        if state.is_terminal() {
            warn!(state = %state, event = ?event, "ignoring event in terminal provisioning state");
            return state;
        }
        match (state, event) {
            (_, ProvisioningEvent::StepFailed { step, cause }) => {
                ProvisioningState::Failed { step, cause }
            }
            (ProvisioningState::NotStarted, ProvisioningEvent::MilestoneReached(next)) => {
                ProvisioningState::Reached(next)
            }
            (ProvisioningState::Reached(current), ProvisioningEvent::MilestoneReached(next))
                if next > current =>
            {
                ProvisioningState::Reached(next)
            }
            (state, _event) => state,
        }
    }
}
