//! Runs an ordered list of steps: skip what is already satisfied, stop at
//! the first failure. No retries and no rollback.

use std::collections::HashSet;
use std::sync::Arc;

use cc_core::{Milestone, ProvisionError, ProvisioningContext, StepFailure};
use tracing::{error, info, info_span, Instrument};

use crate::step::ProvisioningStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Applied,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub name: &'static str,
    pub outcome: StepOutcome,
    pub milestone: Option<Milestone>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub steps: Vec<StepRecord>,
}

impl RunReport {
    pub fn applied(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Applied)
            .map(|s| s.name)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Skipped)
            .map(|s| s.name)
    }
}

/// One entry of a dry-run plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub name: &'static str,
    pub milestone: Option<Milestone>,
    pub requires: &'static [&'static str],
    pub satisfied: bool,
}

/// Progress callbacks, invoked synchronously from the sequencer.
pub trait StepObserver: Send + Sync {
    fn on_step_finished(&self, record: &StepRecord);
    fn on_step_failed(&self, failure: &StepFailure);
}

#[derive(Default)]
pub struct StepSequencer {
    observer: Option<Arc<dyn StepObserver>>,
}

impl StepSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(observer: Arc<dyn StepObserver>) -> Self {
        Self {
            observer: Some(observer),
        }
    }

    /// Every name in `requires()` must belong to an earlier step, and names
    /// must be unique.
    pub fn validate(steps: &[Box<dyn ProvisioningStep>]) -> Result<(), StepFailure> {
        let mut seen: HashSet<&'static str> = HashSet::new();
        for step in steps {
            if let Some(missing) = step.requires().iter().find(|r| !seen.contains(*r)) {
                return Err(StepFailure::new(
                    step.name(),
                    ProvisionError::PlanInvalid(format!(
                        "requires `{}` which does not run before it",
                        missing
                    )),
                ));
            }
            if !seen.insert(step.name()) {
                return Err(StepFailure::new(
                    step.name(),
                    ProvisionError::PlanInvalid("step appears twice".to_string()),
                ));
            }
        }
        Ok(())
    }

    pub async fn run(
        &self,
        steps: &[Box<dyn ProvisioningStep>],
        ctx: &ProvisioningContext,
    ) -> Result<RunReport, StepFailure> {
        if let Err(failure) = Self::validate(steps) {
            self.notify_failed(&failure);
            return Err(failure);
        }

        let mut report = RunReport::default();
        for step in steps {
            let span = info_span!("usecase.provisioning.step", step = step.name());
            let outcome = async {
                if step.is_satisfied(ctx).await {
                    info!("Already satisfied, skipping");
                    return Ok::<_, ProvisionError>(StepOutcome::Skipped);
                }
                info!("Applying");
                step.run(ctx).await?;
                info!("Applied");
                Ok(StepOutcome::Applied)
            }
            .instrument(span)
            .await;

            match outcome {
                Ok(outcome) => {
                    let record = StepRecord {
                        name: step.name(),
                        outcome,
                        milestone: step.milestone(),
                    };
                    if let Some(observer) = &self.observer {
                        observer.on_step_finished(&record);
                    }
                    report.steps.push(record);
                }
                Err(cause) => {
                    let failure = StepFailure::new(step.name(), cause);
                    error!(step = step.name(), error = %failure.cause, "Step failed, aborting run");
                    self.notify_failed(&failure);
                    return Err(failure);
                }
            }
        }
        Ok(report)
    }

    /// Evaluate every predicate without running anything.
    pub async fn plan(
        &self,
        steps: &[Box<dyn ProvisioningStep>],
        ctx: &ProvisioningContext,
    ) -> Result<Vec<PlannedStep>, StepFailure> {
        Self::validate(steps)?;
        let mut planned = Vec::with_capacity(steps.len());
        for step in steps {
            planned.push(PlannedStep {
                name: step.name(),
                milestone: step.milestone(),
                requires: step.requires(),
                satisfied: step.is_satisfied(ctx).await,
            });
        }
        Ok(planned)
    }

    fn notify_failed(&self, failure: &StepFailure) {
        if let Some(observer) = &self.observer {
            observer.on_step_failed(failure);
        }
    }
}
