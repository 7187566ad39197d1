//! `cycle_server` daemon control.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cc_core::ports::{CommandError, CommandRunnerPort, CommandSpec};
use tokio::time::sleep;
use tracing::{info, warn};

/// Upper bound for a single wait between readiness polls.
const MAX_POLL_BACKOFF: Duration = Duration::from_secs(30);

/// Wait after the `miss`-th failed poll: `interval * miss`, capped.
fn poll_backoff(interval: Duration, miss: u32) -> Duration {
    interval.saturating_mul(miss).min(MAX_POLL_BACKOFF)
}

#[derive(Debug, Clone, Copy)]
pub struct StartupPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

#[derive(Clone)]
pub struct ServerControl {
    runner: Arc<dyn CommandRunnerPort>,
    binary: PathBuf,
    policy: StartupPolicy,
}

impl ServerControl {
    pub fn new(runner: Arc<dyn CommandRunnerPort>, binary: PathBuf, policy: StartupPolicy) -> Self {
        Self {
            runner,
            binary,
            policy,
        }
    }

    fn command(&self, verb: &str) -> CommandSpec {
        CommandSpec::from_path(&self.binary).arg(verb)
    }

    /// `cycle_server status` exits zero only while the server is up.
    pub async fn is_running(&self) -> bool {
        self.runner.run(&self.command("status")).await.is_ok()
    }

    pub async fn start(&self) -> Result<(), CommandError> {
        info!(binary = %self.binary.display(), "Starting server");
        self.runner.run(&self.command("start")).await.map(|_| ())
    }

    /// Poll `status` until it succeeds, waiting a little longer after each
    /// miss. Gives up after the configured number of attempts.
    pub async fn await_ready(&self) -> Result<(), CommandError> {
        let status = self.command("status");
        let attempts = self.policy.attempts.max(1);
        let mut waited = Duration::ZERO;

        for attempt in 0..attempts {
            match self.runner.run(&status).await {
                Ok(_) => {
                    info!(attempt = attempt + 1, "Server is ready");
                    return Ok(());
                }
                Err(err) if attempt + 1 < attempts => {
                    let backoff = poll_backoff(self.policy.interval, attempt + 1);
                    warn!(
                        attempt = attempt + 1,
                        error = %err,
                        backoff_ms = backoff.as_millis() as u64,
                        "Server not ready yet"
                    );
                    sleep(backoff).await;
                    waited += backoff;
                }
                Err(err) => {
                    warn!(attempts, error = %err, "Server did not become ready");
                }
            }
        }

        Err(CommandError::TimedOut {
            command: status.to_string(),
            timeout: waited,
        })
    }

    pub async fn ensure_running(&self) -> Result<(), CommandError> {
        if self.is_running().await {
            return Ok(());
        }
        self.start().await?;
        self.await_ready().await
    }
}
