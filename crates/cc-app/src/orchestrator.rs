//! Builds the step plan for one run and drives it through the sequencer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cc_core::provisioning::{ProvisioningEvent, ProvisioningStateMachine};
use cc_core::{BootstrapConfig, ProvisioningContext, ProvisioningState, StepFailure};
use tracing::{info, info_span, Instrument};

use crate::deps::ProvisioningDeps;
use crate::registrar::{CloudAccountRegistrar, CloudAccountRegistrarDeps};
use crate::sequencer::{PlannedStep, RunReport, StepObserver, StepRecord, StepSequencer};
use crate::server::{ServerControl, StartupPolicy};
use crate::ssh::SshKeyProvisioner;
use crate::step::ProvisioningStep;
use crate::steps::{
    ConfigureServer, DownloadArtifacts, EnsureSshKey, FetchLicense, InstallCliTools,
    InstallPrerequisites, InstallServer, RegisterAccount, StartServer, UnpackArtifacts,
};
use crate::tls::TlsCertProvisioner;

/// Feeds sequencer progress into the provisioning state machine.
struct StateTracker {
    state: Mutex<ProvisioningState>,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            state: Mutex::new(ProvisioningState::NotStarted),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProvisioningState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, event: ProvisioningEvent) {
        let mut state = self.lock();
        let next = ProvisioningStateMachine::transition(state.clone(), event);
        if next != *state {
            info!(from = %state, to = %next, "Provisioning state changed");
            *state = next;
        }
    }
}

impl StepObserver for StateTracker {
    fn on_step_finished(&self, record: &StepRecord) {
        if let Some(milestone) = record.milestone {
            self.apply(ProvisioningEvent::MilestoneReached(milestone));
        }
    }

    fn on_step_failed(&self, failure: &StepFailure) {
        self.apply(ProvisioningEvent::StepFailed {
            step: failure.step.clone(),
            cause: failure.cause.to_string(),
        });
    }
}

pub struct ProvisioningOrchestrator {
    deps: ProvisioningDeps,
    config: BootstrapConfig,
    tracker: Arc<StateTracker>,
}

impl ProvisioningOrchestrator {
    pub fn new(deps: ProvisioningDeps, config: BootstrapConfig) -> Self {
        Self {
            deps,
            config,
            tracker: Arc::new(StateTracker::new()),
        }
    }

    fn server_control(&self, ctx: &ProvisioningContext) -> ServerControl {
        ServerControl::new(
            self.deps.runner.clone(),
            ctx.layout().server_binary(),
            StartupPolicy {
                attempts: self.config.startup_poll_attempts,
                interval: self.config.startup_poll_interval(),
            },
        )
    }

    /// Ordered step list for this run. License and registration steps are
    /// only planned when their inputs were supplied.
    pub fn steps(&self, ctx: &ProvisioningContext) -> Vec<Box<dyn ProvisioningStep>> {
        let deps = &self.deps;
        let mut steps: Vec<Box<dyn ProvisioningStep>> = vec![
            Box::new(InstallPrerequisites::new(
                deps.runner.clone(),
                self.config.package_manager.clone(),
                self.config.java_package.clone(),
            )),
            Box::new(DownloadArtifacts::new(deps.fetcher.clone(), deps.fs.clone())),
            Box::new(UnpackArtifacts::new(deps.runner.clone(), deps.fs.clone())),
            Box::new(InstallServer::new(deps.runner.clone(), deps.fs.clone())),
            Box::new(InstallCliTools::new(deps.runner.clone(), deps.fs.clone())),
        ];

        if ctx.license_url().is_some() {
            steps.push(Box::new(FetchLicense::new(
                deps.fetcher.clone(),
                deps.fs.clone(),
                deps.ownership.clone(),
            )));
        }

        steps.push(Box::new(ConfigureServer::new(
            TlsCertProvisioner::new(
                deps.runner.clone(),
                deps.fs.clone(),
                deps.ownership.clone(),
            ),
            deps.patcher.clone(),
        )));
        steps.push(Box::new(EnsureSshKey::new(SshKeyProvisioner::new(
            deps.runner.clone(),
            deps.fs.clone(),
            deps.ownership.clone(),
        ))));

        if ctx.service_principal().is_some() {
            let registrar = CloudAccountRegistrar::from_deps(
                CloudAccountRegistrarDeps {
                    metadata: deps.metadata.clone(),
                    fs: deps.fs.clone(),
                    runner: deps.runner.clone(),
                    ownership: deps.ownership.clone(),
                    server: self.server_control(ctx),
                },
                self.config.cyclecloud_cli.to_string_lossy().into_owned(),
                self.config.server_url.clone(),
            );
            steps.push(Box::new(RegisterAccount::new(registrar)));
        }

        steps.push(Box::new(StartServer::new(self.server_control(ctx))));
        steps
    }

    pub async fn run(&self, ctx: &ProvisioningContext) -> Result<RunReport, StepFailure> {
        let span = info_span!("usecase.provisioning.run");
        async {
            let steps = self.steps(ctx);
            info!(steps = steps.len(), "Starting provisioning run");
            let sequencer = StepSequencer::with_observer(self.tracker.clone());
            let report = sequencer.run(&steps, ctx).await?;
            info!(
                applied = report.applied().count(),
                skipped = report.skipped().count(),
                state = %self.state(),
                "Provisioning run finished"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Evaluates every step's predicate without changing anything.
    pub async fn dry_plan(
        &self,
        ctx: &ProvisioningContext,
    ) -> Result<Vec<PlannedStep>, StepFailure> {
        StepSequencer::new().plan(&self.steps(ctx), ctx).await
    }

    pub fn state(&self) -> ProvisioningState {
        self.tracker.lock().clone()
    }
}
