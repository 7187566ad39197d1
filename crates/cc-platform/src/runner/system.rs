use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cc_core::ports::{CommandArg, CommandError, CommandOutput, CommandRunnerPort, CommandSpec};
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs commands with `tokio::process`. The child is killed when the timeout
/// elapses.
pub struct SystemCommandRunner {
    default_timeout: Duration,
}

impl SystemCommandRunner {
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }
}

#[async_trait]
impl CommandRunnerPort for SystemCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let rendered = spec.to_string();
        let timeout = spec.timeout_override().unwrap_or(self.default_timeout);

        let mut command = Command::new(spec.program());
        command
            .args(spec.arg_list().iter().map(CommandArg::value))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = spec.working_dir() {
            command.current_dir(dir);
        }

        debug!(command = %rendered, timeout_secs = timeout.as_secs(), "Running command");
        let started = Instant::now();

        let output = match tokio::time::timeout(timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(CommandError::Spawn {
                    program: spec.program().to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                warn!(command = %rendered, timeout_secs = timeout.as_secs(), "Command timed out");
                return Err(CommandError::TimedOut {
                    command: rendered,
                    timeout,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
        debug!(
            command = %rendered,
            status = ?output.status.code(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );

        match output.status.code() {
            Some(0) => Ok(CommandOutput {
                status: 0,
                stdout,
                stderr,
            }),
            Some(status) => Err(CommandError::NonZeroExit {
                command: rendered,
                status,
                stderr,
            }),
            None => Err(CommandError::Terminated { command: rendered }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> SystemCommandRunner {
        SystemCommandRunner::new(Duration::from_secs(10))
    }

    #[tokio::test]
    async fn captures_stdout_on_success() {
        let out = runner()
            .run(&CommandSpec::new("sh").args(["-c", "echo hello"]))
            .await
            .unwrap();
        assert_eq!(out.status, 0);
        assert_eq!(out.stdout, "hello\n");
    }

    #[tokio::test]
    async fn non_zero_exit_carries_status_and_stderr() {
        let err = runner()
            .run(&CommandSpec::new("sh").args(["-c", "echo boom >&2; exit 7"]))
            .await
            .unwrap_err();
        match err {
            CommandError::NonZeroExit { status, stderr, .. } => {
                assert_eq!(status, 7);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let err = runner()
            .run(&CommandSpec::new("/nonexistent/definitely-not-here"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[tokio::test]
    async fn timeout_kills_long_running_command() {
        let spec = CommandSpec::new("sleep")
            .arg("30")
            .timeout(Duration::from_millis(100));
        let started = Instant::now();
        let err = runner().run(&spec).await.unwrap_err();
        assert!(matches!(err, CommandError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn runs_in_requested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = runner()
            .run(&CommandSpec::new("pwd").current_dir(dir.path()))
            .await
            .unwrap();
        let reported = std::fs::canonicalize(out.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[tokio::test]
    async fn error_message_redacts_secret_arguments() {
        let spec = CommandSpec::new("sh")
            .args(["-c", "exit 3", "sh"])
            .secret_arg("hunter2");
        let err = runner().run(&spec).await.unwrap_err();
        assert_eq!(err.exit_status(), Some(3));
        assert!(!err.to_string().contains("hunter2"));
    }
}
