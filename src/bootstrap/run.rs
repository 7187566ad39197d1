//! Process lifecycle: config, tracing, host lock, working dir, provisioning
//! run and exit code.

use std::fmt::Write as _;
use std::process::ExitCode;

use anyhow::Context;
use cc_app::{PlannedStep, ProvisioningOrchestrator};
use cc_core::context::ProvisioningInputs;
use cc_core::{BootstrapConfig, InstallLayout, ProvisioningContext};
use cc_platform::{HostLock, LockError};
use tracing::{error, info};

use super::cli::Cli;
use super::config::resolve_config;
use super::tracing::init_tracing_subscriber;
use super::wiring::wire_dependencies;

/// Exit status when another run holds the host lock.
pub const EXIT_LOCK_HELD: u8 = 3;

const WORKDIR_PREFIX: &str = "cyclecloud-bootstrap-";

pub fn run_app(cli: Cli) -> ExitCode {
    let (config, config_path) = match resolve_config(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("{err:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_tracing_subscriber(config.log_dir.as_deref()) {
        eprintln!("Failed to initialize tracing: {err:#}");
    }
    match &config_path {
        Some(path) => info!(path = %path.display(), "Loaded configuration"),
        None => info!("No configuration file, using defaults"),
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "Failed to build async runtime");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(execute(cli, config))
}

async fn execute(cli: Cli, config: BootstrapConfig) -> ExitCode {
    let dry_plan = cli.dry_plan;
    let inputs = match cli.into_inputs(&config.admin_username) {
        Ok(inputs) => inputs,
        Err(err) => {
            error!(error = %err, "Invalid arguments");
            return ExitCode::from(err.exit_code());
        }
    };

    // Planning only reads host state, so it does not contend for the lock.
    let _lock = if dry_plan {
        None
    } else {
        match HostLock::acquire(&config.lock_path) {
            Ok(lock) => Some(lock),
            Err(LockError::Held { path }) => {
                error!(path = %path.display(), "Another bootstrap run is in progress");
                return ExitCode::from(EXIT_LOCK_HELD);
            }
            Err(err) => {
                error!(error = %err, "Failed to acquire host lock");
                return ExitCode::FAILURE;
            }
        }
    };

    match provision(inputs, &config, dry_plan).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %format!("{err:#}"), "Bootstrap failed");
            ExitCode::FAILURE
        }
    }
}

async fn provision(
    inputs: ProvisioningInputs,
    config: &BootstrapConfig,
    dry_plan: bool,
) -> anyhow::Result<ExitCode> {
    let home = dirs::home_dir().context("Cannot determine the home directory")?;
    let workdir = tempfile::Builder::new()
        .prefix(WORKDIR_PREFIX)
        .tempdir()
        .context("Failed to create working directory")?;
    info!(dir = %workdir.path().display(), "Created working directory");

    let layout = InstallLayout::new(config, home);
    let ctx = ProvisioningContext::new(inputs, layout, workdir.path().to_path_buf());
    let deps = wire_dependencies(config).context("Failed to wire dependencies")?;
    let orchestrator = ProvisioningOrchestrator::new(deps, config.clone());

    if dry_plan {
        let plan = orchestrator
            .dry_plan(&ctx)
            .await
            .context("Failed to build step plan")?;
        print!("{}", render_plan(&plan));
        return Ok(ExitCode::SUCCESS);
    }

    match orchestrator.run(&ctx).await {
        Ok(report) => {
            info!(
                applied = report.applied().count(),
                skipped = report.skipped().count(),
                "CycleCloud bootstrap complete"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            error!(
                step = %failure.step,
                error = %failure.cause,
                state = %orchestrator.state(),
                "Bootstrap failed, host left partially provisioned"
            );
            Ok(ExitCode::from(failure.exit_code()))
        }
    }
}

/// One line per step: position, name, predicate result and milestone.
pub fn render_plan(plan: &[PlannedStep]) -> String {
    let width = plan.iter().map(|step| step.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (idx, step) in plan.iter().enumerate() {
        let status = if step.satisfied { "satisfied" } else { "pending" };
        let _ = write!(out, "{:>2}. {:<width$}  {:<9}", idx + 1, step.name, status);
        if let Some(milestone) = step.milestone {
            let _ = write!(out, "  -> {milestone}");
        }
        out.push('\n');
    }
    out
}
